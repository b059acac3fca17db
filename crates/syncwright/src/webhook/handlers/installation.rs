use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::{InstallationGoneReason, Result};
use crate::payload::InstallationPayload;
use crate::processor::organization;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct InstallationEvent {
    pub action: String,
    pub installation: InstallationPayload,
}

/// Attaches installations to tenants and evicts them on removal or suspension.
pub struct InstallationHandler;

#[async_trait]
impl TypedWebhookHandler for InstallationHandler {
    type Event = InstallationEvent;

    const EVENT_TYPE: EventType = EventType::Installation;

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &InstallationEvent,
    ) -> Result<Vec<FollowUp>> {
        let installation_id = event.installation.id;
        let reason = match event.action.as_str() {
            "deleted" => InstallationGoneReason::Removed,
            "suspend" => InstallationGoneReason::Suspended,
            _ => {
                if let Some(account) = &event.installation.account {
                    if account.user_type.as_deref() == Some("Organization") {
                        let owner = organization::from_owner(account);
                        organization::find_or_create(txn, &owner).await?;
                    }
                    match ctx.tenants.set_installation(&account.login, Some(installation_id)) {
                        Some(tenant) => {
                            tracing::info!(tenant, installation_id, "installation attached")
                        }
                        None => {
                            tracing::debug!(
                                account = %account.login,
                                "installation for unknown account"
                            )
                        }
                    }
                }
                return Ok(Vec::new());
            }
        };
        Ok(vec![FollowUp::EvictInstallation {
            installation_id,
            reason,
        }])
    }
}
