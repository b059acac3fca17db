use clap::ValueEnum;
use console::style;
use syncwright::SyncType;
use syncwright::reconcile::ReconcileOutcome;

use crate::commands::shared::build_engine;
use crate::config::Config;
use crate::progress::progress_callback;

/// Which reconciliation pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReconcileKind {
    IssueTypes,
    Labels,
    Teams,
    IssueRelations,
    ReviewThreads,
    /// Every pass, in order
    All,
}

impl ReconcileKind {
    fn sync_types(self) -> Vec<SyncType> {
        match self {
            Self::IssueTypes => vec![SyncType::IssueTypes],
            Self::Labels => vec![SyncType::Labels],
            Self::Teams => vec![SyncType::Teams],
            Self::IssueRelations => vec![SyncType::IssueRelations],
            Self::ReviewThreads => vec![SyncType::ReviewThreads],
            Self::All => SyncType::ALL.to_vec(),
        }
    }
}

pub(crate) async fn handle_reconcile(
    kind: ReconcileKind,
    tenant_id: i64,
    force: bool,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let tenant = config.tenant(tenant_id)?.clone();
    let engine = build_engine(config, database_url).await?;
    let on_progress = progress_callback();

    let mut failures = 0usize;
    for sync_type in kind.sync_types() {
        match engine
            .reconciler
            .run(&tenant, sync_type, force, Some(&on_progress))
            .await
        {
            Ok(ReconcileOutcome::Completed(stats)) => {
                println!(
                    "{} {}: {} upserted, {} pruned over {} page(s){}",
                    style("✓").green().bold(),
                    style(sync_type).cyan(),
                    stats.upserted,
                    stats.pruned,
                    stats.pages,
                    if stats.truncated {
                        " (page ceiling reached, pruning skipped)"
                    } else {
                        ""
                    }
                );
            }
            Ok(ReconcileOutcome::Skipped {
                next_eligible_at, ..
            }) => {
                println!(
                    "{} {}: cooldown active until {} (use --force to override)",
                    style("-").dim(),
                    style(sync_type).cyan(),
                    next_eligible_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            Err(err) => {
                failures += 1;
                println!(
                    "{} {}: {}",
                    style("✗").red().bold(),
                    style(sync_type).cyan(),
                    err
                );
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} reconciliation pass(es) failed").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_expands_to_every_pass() {
        assert_eq!(ReconcileKind::All.sync_types(), SyncType::ALL.to_vec());
        assert_eq!(ReconcileKind::Teams.sync_types(), vec![SyncType::Teams]);
    }

    #[test]
    fn kinds_parse_in_kebab_case() {
        assert_eq!(
            ReconcileKind::from_str("review-threads", false),
            Ok(ReconcileKind::ReviewThreads)
        );
    }
}
