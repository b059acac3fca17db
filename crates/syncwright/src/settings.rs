//! Engine settings.
//!
//! Plain serde types with defaults; the CLI fills them from layered
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default GitHub REST and GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Top-level engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub reconcile: ReconcileSettings,
    pub broker: BrokerSettings,
    pub graphql: GraphQlSettings,
}

/// Reconciliation pass tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Nodes requested per page (`first`).
    pub page_size: u32,
    /// Hard ceiling on pages fetched in one pass.
    pub max_pages: u32,
    /// Page size for nested connections (team members, thread comments).
    pub inner_page_size: u32,
    /// Minimum time between two passes of the same kind for a tenant.
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
    /// Scheduler tick.
    #[serde(with = "duration_secs")]
    pub interval: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 100,
            inner_page_size: 50,
            cooldown: Duration::from_secs(60 * 60),
            interval: Duration::from_secs(15 * 60),
        }
    }
}

/// Inbound stream consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub url: String,
    pub stream: String,
    /// Durable consumer name.
    pub consumer: String,
    /// Leading subject token.
    pub namespace: String,
    /// How far back a fresh consumer starts replaying.
    pub replay_days: u32,
    /// Messages processed concurrently.
    pub max_in_flight: usize,
    /// Redeliveries before the broker gives up on a message.
    pub max_deliver: i64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            stream: "GITHUB_WEBHOOKS".to_string(),
            consumer: "syncwright".to_string(),
            namespace: "github".to_string(),
            replay_days: 30,
            max_in_flight: 8,
            max_deliver: 10,
        }
    }
}

/// Outbound GraphQL behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphQlSettings {
    pub api_url: String,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub requests_per_second: u32,
    /// Consecutive outage failures before a tenant's circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit fails fast before allowing a trial call.
    #[serde(with = "duration_secs")]
    pub open_duration: Duration,
}

impl Default for GraphQlSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            requests_per_second: 10,
            failure_threshold: 5,
            open_duration: Duration::from_secs(60),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
