use syncwright::reconcile::ReconcileProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: ReconcileProgress) {
        match event {
            ReconcileProgress::Started { tenant, kind } => {
                tracing::info!(tenant, kind = %kind, "Reconciling");
            }

            ReconcileProgress::Skipped {
                tenant,
                kind,
                next_eligible_at,
            } => {
                tracing::info!(
                    tenant,
                    kind = %kind,
                    next_eligible_at = %next_eligible_at,
                    "Skipped, cooldown not elapsed"
                );
            }

            ReconcileProgress::FetchedPage {
                tenant,
                kind,
                scope,
                page,
                count,
            } => {
                tracing::debug!(tenant, kind = %kind, scope = %scope, page, count, "Fetched page");
            }

            ReconcileProgress::Truncated {
                tenant,
                kind,
                scope,
                pages,
            } => {
                tracing::warn!(
                    tenant,
                    kind = %kind,
                    scope = %scope,
                    pages,
                    "Page ceiling reached, pruning skipped"
                );
            }

            ReconcileProgress::Backoff {
                query,
                retry_after_ms,
                attempt,
            } => {
                tracing::info!(query = %query, retry_after_ms, attempt, "Retrying query");
            }

            ReconcileProgress::Completed { tenant, kind, stats } => {
                tracing::info!(
                    tenant,
                    kind = %kind,
                    pages = stats.pages,
                    upserted = stats.upserted,
                    pruned = stats.pruned,
                    links_added = stats.links_added,
                    links_removed = stats.links_removed,
                    "Reconciled"
                );
            }

            ReconcileProgress::Failed { tenant, kind, error } => {
                tracing::warn!(tenant, kind = %kind, error = %error, "Reconciliation failed");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
