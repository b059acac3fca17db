//! Generic webhook handling template.
//!
//! Each handler implements [`TypedWebhookHandler`]; the blanket
//! [`WebhookHandler`] impl deserializes the body, skips events whose owner is
//! outside every tenant, runs `handle_event` inside one transaction and, after
//! a successful commit, executes the returned [`FollowUp`]s.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::de::DeserializeOwned;

use crate::context::EngineContext;
use crate::error::{HandlerFailure, InstallationGoneReason, Result, SyncError};
use crate::processor::contribution::{self, ContributionRecord};
use crate::tenant::ScopeFilter;

use super::events::EventType;

/// Work that must only happen once the event's transaction committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    RecordContribution(ContributionRecord),
    /// Evict the installation, then report it gone.
    EvictInstallation {
        installation_id: i64,
        reason: InstallationGoneReason,
    },
}

/// Object-safe handler stored in the registry.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    fn event_type(&self) -> EventType;

    async fn handle(
        &self,
        ctx: &EngineContext,
        payload: &[u8],
    ) -> std::result::Result<(), HandlerFailure>;
}

/// A handler for one event type with a typed payload.
#[async_trait]
pub trait TypedWebhookHandler: Send + Sync + 'static {
    type Event: DeserializeOwned + Send + Sync;

    const EVENT_TYPE: EventType;

    /// Whether the event's owning repository or organization is monitored.
    fn in_scope(&self, _scope: &dyn ScopeFilter, _event: &Self::Event) -> bool {
        true
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &Self::Event,
    ) -> Result<Vec<FollowUp>>;
}

#[async_trait]
impl<H: TypedWebhookHandler> WebhookHandler for H {
    fn event_type(&self) -> EventType {
        H::EVENT_TYPE
    }

    async fn handle(
        &self,
        ctx: &EngineContext,
        payload: &[u8],
    ) -> std::result::Result<(), HandlerFailure> {
        let event: H::Event = serde_json::from_slice(payload).map_err(SyncError::from)?;
        if !self.in_scope(ctx.tenants.as_ref(), &event) {
            tracing::debug!(event_type = %H::EVENT_TYPE, "event outside monitored scope skipped");
            return Ok(());
        }

        let txn = ctx.db.begin().await?;
        let follow_ups = match self.handle_event(&txn, ctx, &event).await {
            Ok(follow_ups) => {
                txn.commit().await?;
                follow_ups
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(
                        event_type = %H::EVENT_TYPE,
                        error = %rollback,
                        "rollback failed"
                    );
                }
                return Err(err.into());
            }
        };

        for follow_up in follow_ups {
            run_follow_up(ctx, follow_up).await?;
        }
        Ok(())
    }
}

async fn run_follow_up(ctx: &EngineContext, follow_up: FollowUp) -> Result<()> {
    match follow_up {
        FollowUp::RecordContribution(record) => contribution::record(&ctx.db, &record).await,
        FollowUp::EvictInstallation {
            installation_id,
            reason,
        } => {
            ctx.evict_installation(installation_id).await?;
            Err(SyncError::InstallationGone {
                installation_id,
                reason,
            })
        }
    }
}
