//! Syncwright CLI - runs the GitHub synchronization engine.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::reconcile::ReconcileKind;
use crate::commands::status::OutputFormat;

#[derive(Parser)]
#[command(name = "syncwright")]
#[command(version)]
#[command(about = "Mirror GitHub state into a local database")]
#[command(
    long_about = "Syncwright keeps a local database eventually consistent with GitHub. \
Webhooks arrive through a durable NATS JetStream stream and are applied by idempotent \
handlers; periodic GraphQL reconciliation repairs whatever the webhooks missed."
)]
#[command(after_long_help = r#"EXAMPLES
    Create or upgrade the schema:
        $ syncwright migrate up

    Consume webhooks and reconcile on a schedule:
        $ syncwright serve

    Reconcile issue relations for tenant 1 now, ignoring the cooldown:
        $ syncwright reconcile issue-relations --tenant 1 --force

    Show the subjects the dispatcher subscribes to:
        $ syncwright subjects

    Generate shell completions:
        $ syncwright completions bash > ~/.local/share/bash-completion/completions/syncwright

CONFIGURATION
    Syncwright reads configuration from:
      1. ~/.config/syncwright/config.toml (or $XDG_CONFIG_HOME/syncwright/config.toml)
      2. ./syncwright.toml
      3. Environment variables (SYNCWRIGHT_ prefix, `__` between section and key)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    SYNCWRIGHT_DATABASE__URL            Database connection string
                                        (default: ~/.local/state/syncwright/syncwright.db)
    SYNCWRIGHT_BROKER__URL              NATS server URL
    SYNCWRIGHT_GITHUB__APP_ID           GitHub App id
    SYNCWRIGHT_GITHUB__PRIVATE_KEY_PATH GitHub App private key (PEM)
    SYNCWRIGHT_GITHUB__TOKEN            Personal access token, used when no App is configured
    RUST_LOG                            Log filter (default: syncwright=info,syncwright_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Consume webhooks and run scheduled reconciliation until Ctrl+C
    Serve,
    /// Run reconciliation passes for one tenant
    Reconcile {
        /// Pass to run
        #[arg(value_enum)]
        kind: ReconcileKind,
        /// Tenant id from the configuration
        #[arg(short, long)]
        tenant: i64,
        /// Ignore the cooldown
        #[arg(short, long)]
        force: bool,
    },
    /// Print the broker subjects the dispatcher subscribes to
    Subjects,
    /// Show when each reconciliation pass last completed
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("syncwright=info,syncwright_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    let config = config::Config::load()?;

    if let Commands::Subjects = &cli.command {
        commands::subjects::handle_subjects(&config)?;
        return Ok(());
    }

    let database_url = config.database_url()?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Serve => {
            commands::serve::handle_serve(&config, &database_url).await?;
        }
        Commands::Reconcile {
            kind,
            tenant,
            force,
        } => {
            commands::reconcile::handle_reconcile(kind, tenant, force, &config, &database_url)
                .await?;
        }
        Commands::Status { output } => {
            let db = syncwright::connect_and_migrate(&database_url).await?;
            commands::status::handle_status(output, &config, &db).await?;
        }
        Commands::Subjects | Commands::Completions { .. } => {}
    }

    Ok(())
}
