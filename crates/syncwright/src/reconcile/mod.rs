//! Cursor-paginated reconciliation against the GraphQL API.
//!
//! A pass is gated by a per-tenant cooldown stored in `sync_metadata`. It
//! walks every page up to a ceiling, upserts each node through the
//! processors and prunes local rows that upstream no longer has. Pruning
//! only happens for scopes walked to completion. The timestamp is recorded
//! only after the whole pass succeeded.

mod issue_relations;
mod issue_types;
mod labels;
pub mod paginate;
mod review_threads;
pub mod scheduler;
mod teams;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::entity::repository;
use crate::entity::sync_type::SyncType;
use crate::error::{Result, SyncError};
use crate::graphql::GraphQlClient;
use crate::processor::{self, sync_metadata};
use crate::settings::ReconcileSettings;
use crate::tenant::Tenant;

pub use paginate::Paginator;
pub use scheduler::Scheduler;
pub use types::{ProgressCallback, ReconcileOutcome, ReconcileProgress, ReconcileStats, emit};

/// Runs reconciliation passes for tenants.
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) db: DatabaseConnection,
    pub(crate) client: Arc<dyn GraphQlClient>,
    pub(crate) settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(
        db: DatabaseConnection,
        client: Arc<dyn GraphQlClient>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            db,
            client,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// When `kind` next becomes eligible, or `None` if it is eligible now.
    pub async fn cooldown_remaining(
        &self,
        tenant: &Tenant,
        kind: SyncType,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let Some(last) = sync_metadata::last_synced_at(&self.db, tenant.id, kind).await? else {
            return Ok(None);
        };
        let cooldown = chrono::Duration::from_std(self.settings.cooldown)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let next = last + cooldown;
        Ok((Utc::now() < next).then_some((last, next)))
    }

    /// Run one pass unless its cooldown has not elapsed (`force` bypasses it).
    pub async fn run(
        &self,
        tenant: &Tenant,
        kind: SyncType,
        force: bool,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ReconcileOutcome> {
        if !force && let Some((last, next)) = self.cooldown_remaining(tenant, kind).await? {
            tracing::debug!(
                tenant = tenant.id,
                kind = %kind,
                next_eligible_at = %next,
                "pass in cooldown"
            );
            emit(
                on_progress,
                ReconcileProgress::Skipped {
                    tenant: tenant.id,
                    kind,
                    next_eligible_at: next,
                },
            );
            return Ok(ReconcileOutcome::Skipped {
                last_synced_at: last,
                next_eligible_at: next,
            });
        }

        emit(on_progress, ReconcileProgress::Started { tenant: tenant.id, kind });
        let started = std::time::Instant::now();

        let result = match kind {
            SyncType::IssueTypes => issue_types::reconcile(self, tenant, on_progress).await,
            SyncType::Labels => labels::reconcile(self, tenant, on_progress).await,
            SyncType::Teams => teams::reconcile(self, tenant, on_progress).await,
            SyncType::IssueRelations => issue_relations::reconcile(self, tenant, on_progress).await,
            SyncType::ReviewThreads => review_threads::reconcile(self, tenant, on_progress).await,
        };

        let stats = match result {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(
                    tenant = tenant.id,
                    kind = %kind,
                    error = %err,
                    "reconciliation failed"
                );
                emit(
                    on_progress,
                    ReconcileProgress::Failed {
                        tenant: tenant.id,
                        kind,
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        sync_metadata::record(&self.db, tenant.id, kind, Utc::now()).await?;
        tracing::info!(
            tenant = tenant.id,
            kind = %kind,
            pages = stats.pages,
            upserted = stats.upserted,
            pruned = stats.pruned,
            truncated = stats.truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reconciliation complete"
        );
        emit(
            on_progress,
            ReconcileProgress::Completed {
                tenant: tenant.id,
                kind,
                stats: stats.clone(),
            },
        );
        Ok(ReconcileOutcome::Completed(stats))
    }

    /// Run every pass kind for a tenant, in order.
    ///
    /// Stops early when the tenant's circuit is open or its installation is
    /// gone; other failures are returned alongside later outcomes.
    pub async fn run_all(
        &self,
        tenant: &Tenant,
        force: bool,
        on_progress: Option<&ProgressCallback>,
    ) -> Vec<(SyncType, Result<ReconcileOutcome>)> {
        let mut outcomes = Vec::with_capacity(SyncType::ALL.len());
        for kind in SyncType::ALL {
            let outcome = self.run(tenant, kind, force, on_progress).await;
            let stop = matches!(
                &outcome,
                Err(SyncError::CircuitOpen { .. } | SyncError::InstallationGone { .. })
            );
            outcomes.push((kind, outcome));
            if stop {
                break;
            }
        }
        outcomes
    }

    /// Local repository rows for the tenant's monitored repositories.
    ///
    /// Repositories not synchronized yet are skipped; their webhooks create them.
    pub(crate) async fn local_repositories(
        &self,
        tenant: &Tenant,
    ) -> Result<Vec<repository::Model>> {
        let mut repos = Vec::new();
        for full_name in &tenant.repositories {
            match processor::repository::find_by_full_name(&self.db, full_name).await? {
                Some(repo) => repos.push(repo),
                None => tracing::debug!(
                    tenant = tenant.id,
                    repository = %full_name,
                    "repository not synced yet"
                ),
            }
        }
        Ok(repos)
    }
}
