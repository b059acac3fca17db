//! Configuration file support for syncwright.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `SYNCWRIGHT_`, e.g. `SYNCWRIGHT_DATABASE_URL`)
//! 2. Local config file (`./syncwright.toml`)
//! 3. XDG config file (`~/.config/syncwright/config.toml`)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "postgres://syncwright@localhost/syncwright"
//!
//! [broker]
//! url = "nats://127.0.0.1:4222"
//! stream = "GITHUB_WEBHOOKS"
//! consumer = "syncwright"
//! namespace = "github"
//! replay_days = 30
//! max_in_flight = 8
//!
//! [github]
//! app_id = 123456
//! private_key_path = "/etc/syncwright/app.pem"
//! # or a personal access token instead of an app:
//! # token = "ghp_..."
//!
//! [sync]
//! page_size = 50
//! max_pages = 100
//! cooldown_minutes = 60
//! interval_minutes = 15
//!
//! [[tenants]]
//! id = 1
//! organization = "acme"
//! installation_id = 42
//! repositories = ["acme/api", "acme/web"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use syncwright::http::HttpTransport;
use syncwright::provider::{AppTokenProvider, StaticTokenProvider, TokenProvider};
use syncwright::settings::{
    BrokerSettings, DEFAULT_API_URL, EngineSettings, GraphQlSettings, ReconcileSettings,
};
use syncwright::tenant::Tenant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("could not determine a database location; set SYNCWRIGHT_DATABASE_URL")]
    NoDatabase,
    #[error(
        "no GitHub credentials configured; \
         set github.app_id and github.private_key_path, or github.token"
    )]
    NoCredentials,
    #[error("failed to read private key {path}: {source}")]
    PrivateKey {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid GitHub App key: {0}")]
    InvalidKey(#[from] syncwright::provider::TokenError),
    #[error("unknown tenant {0}")]
    UnknownTenant(i64),
    #[error("tenant ids must be unique, {0} appears twice")]
    DuplicateTenant(i64),
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub broker: BrokerSettings,
    pub github: GitHubConfig,
    pub sync: SyncConfig,
    pub tenants: Vec<Tenant>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/syncwright/syncwright.db` if not specified.
    pub url: Option<String>,
}

/// GitHub credentials. An App (id + key) takes precedence over a token.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub app_id: Option<u64>,
    pub private_key_path: Option<PathBuf>,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            app_id: None,
            private_key_path: None,
            token: None,
        }
    }
}

/// Reconciliation and outbound request tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u32,
    pub max_pages: u32,
    pub cooldown_minutes: u64,
    pub interval_minutes: u64,
    pub request_timeout_secs: u64,
    pub requests_per_second: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let reconcile = ReconcileSettings::default();
        let graphql = GraphQlSettings::default();
        Self {
            page_size: reconcile.page_size,
            max_pages: reconcile.max_pages,
            cooldown_minutes: reconcile.cooldown.as_secs() / 60,
            interval_minutes: reconcile.interval.as_secs() / 60,
            request_timeout_secs: graphql.request_timeout.as_secs(),
            requests_per_second: graphql.requests_per_second,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder
                .add_source(File::from(xdg_config).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("syncwright.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./syncwright.toml");
            builder = builder
                .add_source(File::from(local_config).format(FileFormat::Toml).required(false));
        }

        // SYNCWRIGHT_DATABASE__URL -> database.url, SYNCWRIGHT_GITHUB__TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("SYNCWRIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for tenant in &self.tenants {
            if !seen.insert(tenant.id) {
                return Err(ConfigError::DuplicateTenant(tenant.id));
            }
        }
        Ok(())
    }

    /// Database URL, falling back to the default state directory.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }
        let state_dir = Self::default_state_dir().ok_or(ConfigError::NoDatabase)?;
        let db_path = state_dir.join("syncwright.db");
        Ok(format!("sqlite://{}?mode=rwc", db_path.display()))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = ReconcileSettings::default();
        EngineSettings {
            reconcile: ReconcileSettings {
                page_size: self.sync.page_size,
                max_pages: self.sync.max_pages,
                inner_page_size: defaults.inner_page_size,
                cooldown: Duration::from_secs(self.sync.cooldown_minutes * 60),
                interval: Duration::from_secs(self.sync.interval_minutes * 60),
            },
            broker: self.broker.clone(),
            graphql: GraphQlSettings {
                api_url: self.github.api_url.clone(),
                request_timeout: Duration::from_secs(self.sync.request_timeout_secs),
                requests_per_second: self.sync.requests_per_second,
                ..GraphQlSettings::default()
            },
        }
    }

    pub fn tenant(&self, id: i64) -> Result<&Tenant, ConfigError> {
        self.tenants
            .iter()
            .find(|t| t.id == id)
            .ok_or(ConfigError::UnknownTenant(id))
    }

    /// Token provider for the configured credentials.
    pub fn token_provider(
        &self,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Arc<dyn TokenProvider>, ConfigError> {
        match (&self.github.app_id, &self.github.private_key_path, &self.github.token) {
            (Some(app_id), Some(key_path), _) => {
                let pem = read_key(key_path)?;
                let provider = AppTokenProvider::from_rsa_pem(
                    *app_id,
                    &pem,
                    self.github.api_url.clone(),
                    transport,
                )?;
                Ok(Arc::new(provider))
            }
            (_, _, Some(token)) => Ok(Arc::new(StaticTokenProvider::new(token.clone()))),
            _ => Err(ConfigError::NoCredentials),
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "syncwright").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// On Linux, this is `$XDG_STATE_HOME/syncwright` or `~/.local/state/syncwright`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "syncwright").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

fn read_key(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::PrivateKey {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.tenants.is_empty());
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.sync.cooldown_minutes, 60);
        assert_eq!(config.sync.interval_minutes, 15);
        assert_eq!(config.broker.namespace, "github");
    }

    #[test]
    fn test_full_document() {
        let config = from_toml(
            r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [broker]
            namespace = "gh"
            max_in_flight = 2

            [github]
            token = "ghp_test123"

            [sync]
            max_pages = 5
            cooldown_minutes = 10

            [[tenants]]
            id = 7
            organization = "acme"
            installation_id = 99
            repositories = ["acme/api"]
        "#,
        );

        assert_eq!(config.database_url().unwrap(), "sqlite:///tmp/test.db");
        assert_eq!(config.broker.namespace, "gh");
        assert_eq!(config.broker.stream, "GITHUB_WEBHOOKS");
        assert_eq!(config.github.token.as_deref(), Some("ghp_test123"));

        let tenant = config.tenant(7).unwrap();
        assert_eq!(tenant.installation_id, Some(99));
        assert_eq!(tenant.repositories, vec!["acme/api".to_string()]);
        assert!(matches!(config.tenant(8), Err(ConfigError::UnknownTenant(8))));

        let settings = config.engine_settings();
        assert_eq!(settings.reconcile.max_pages, 5);
        assert_eq!(settings.reconcile.page_size, 50);
        assert_eq!(settings.reconcile.cooldown, Duration::from_secs(600));
        assert_eq!(settings.broker.max_in_flight, 2);
    }

    #[test]
    fn test_duplicate_tenants_rejected() {
        let config = from_toml(
            r#"
            [[tenants]]
            id = 1
            organization = "a"

            [[tenants]]
            id = 1
            organization = "b"
        "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateTenant(1))));
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        let transport: Arc<dyn HttpTransport> = Arc::new(
            syncwright::http::ReqwestTransport::with_timeout(Duration::from_secs(1)).unwrap(),
        );
        assert!(matches!(
            config.token_provider(transport),
            Err(ConfigError::NoCredentials)
        ));
    }

    #[test]
    fn test_static_token_provider() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_x"
        "#,
        );
        let transport: Arc<dyn HttpTransport> = Arc::new(
            syncwright::http::ReqwestTransport::with_timeout(Duration::from_secs(1)).unwrap(),
        );
        assert!(config.token_provider(transport).is_ok());
    }
}
