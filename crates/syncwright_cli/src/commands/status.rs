use chrono::{DateTime, Utc};
use clap::ValueEnum;
use sea_orm::DatabaseConnection;
use syncwright::processor::sync_metadata;
use syncwright::settings::ReconcileSettings;
use tabled::{Table, Tabled, settings::Style};

use crate::config::Config;

/// Output format for the status table.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

#[derive(Debug, Clone, serde::Serialize, Tabled)]
pub(crate) struct SyncStatusRow {
    #[tabled(rename = "Tenant")]
    pub tenant: i64,
    #[tabled(rename = "Organization")]
    pub organization: String,
    #[tabled(rename = "Pass")]
    pub pass: String,
    #[tabled(rename = "Last Synced")]
    pub last_synced_at: String,
    #[tabled(rename = "Next Eligible")]
    pub next_eligible: String,
}

fn build_rows(
    records: Vec<syncwright::SyncMetadataModel>,
    config: &Config,
    settings: &ReconcileSettings,
    now: DateTime<Utc>,
) -> Vec<SyncStatusRow> {
    let cooldown =
        chrono::Duration::from_std(settings.cooldown).unwrap_or_else(|_| chrono::Duration::zero());
    records
        .into_iter()
        .map(|record| {
            let last = record.last_synced_at.with_timezone(&Utc);
            let next = last + cooldown;
            SyncStatusRow {
                tenant: record.tenant_id,
                organization: config
                    .tenant(record.tenant_id)
                    .map(|t| t.organization.clone())
                    .unwrap_or_else(|_| "-".to_string()),
                pass: record.sync_type.to_string(),
                last_synced_at: last.format("%Y-%m-%d %H:%M:%S").to_string(),
                next_eligible: if next <= now {
                    "now".to_string()
                } else {
                    next.format("%Y-%m-%d %H:%M:%S").to_string()
                },
            }
        })
        .collect()
}

pub(crate) async fn handle_status(
    output: OutputFormat,
    config: &Config,
    db: &DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = sync_metadata::list(db).await?;
    let settings = config.engine_settings().reconcile;
    let rows = build_rows(records, config, &settings, Utc::now());

    match output {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No reconciliation pass has completed yet.");
                return Ok(());
            }
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use syncwright::SyncType;

    #[test]
    fn rows_show_next_eligible_time() {
        let now = Utc::now();
        let config = Config::default();
        let settings = ReconcileSettings {
            cooldown: Duration::from_secs(3600),
            ..ReconcileSettings::default()
        };
        let records = vec![
            syncwright::SyncMetadataModel {
                id: 1,
                tenant_id: 1,
                sync_type: SyncType::Labels,
                last_synced_at: (now - chrono::Duration::hours(2)).fixed_offset(),
            },
            syncwright::SyncMetadataModel {
                id: 2,
                tenant_id: 1,
                sync_type: SyncType::Teams,
                last_synced_at: (now - chrono::Duration::minutes(10)).fixed_offset(),
            },
        ];
        let rows = build_rows(records, &config, &settings, now);
        assert_eq!(rows[0].next_eligible, "now");
        assert_ne!(rows[1].next_eligible, "now");
        assert_eq!(rows[1].pass, "teams");
        assert_eq!(rows[0].organization, "-");
    }
}
