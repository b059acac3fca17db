//! Periodic reconciliation across tenants.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::context::EngineContext;
use crate::error::SyncError;

use super::types::{ProgressCallback, ReconcileOutcome};
use super::Reconciler;

/// Counters for one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Tenants passed over because their circuit was open.
    pub tenants_skipped: usize,
}

pub struct Scheduler {
    reconciler: Reconciler,
    context: EngineContext,
    interval: Duration,
}

impl Scheduler {
    pub fn new(reconciler: Reconciler, context: EngineContext) -> Self {
        let interval = reconciler.settings().interval;
        Self {
            reconciler,
            context,
            interval,
        }
    }

    /// Tick until `shutdown` is cancelled. The first tick runs immediately.
    pub async fn run(self, shutdown: CancellationToken, on_progress: Option<ProgressCallback>) {
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let summary = self.tick(on_progress.as_ref()).await;
                    tracing::debug!(?summary, "scheduler tick");
                }
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// Run every eligible pass for every tenant once.
    pub async fn tick(&self, on_progress: Option<&ProgressCallback>) -> TickSummary {
        let mut summary = TickSummary::default();

        for tenant in self.context.tenants.tenants() {
            if self.context.circuits.is_open(tenant.id) {
                tracing::debug!(tenant = tenant.id, "circuit open, tenant skipped");
                summary.tenants_skipped += 1;
                continue;
            }

            for (_, outcome) in self.reconciler.run_all(&tenant, false, on_progress).await {
                match outcome {
                    Ok(ReconcileOutcome::Completed(_)) => summary.completed += 1,
                    Ok(ReconcileOutcome::Skipped { .. }) => summary.skipped += 1,
                    Err(SyncError::InstallationGone { installation_id, reason }) => {
                        summary.failed += 1;
                        tracing::warn!(
                            tenant = tenant.id,
                            installation_id,
                            %reason,
                            "installation gone"
                        );
                        if let Err(err) = self.context.evict_installation(installation_id).await {
                            tracing::error!(
                                installation_id,
                                error = %err,
                                "failed to evict installation"
                            );
                        }
                    }
                    Err(SyncError::CircuitOpen { .. }) => summary.tenants_skipped += 1,
                    Err(_) => summary.failed += 1,
                }
            }
        }

        summary
    }
}
