//! Syncwright - mirrors GitHub state into a local database.
//!
//! Two feeds keep the store eventually consistent:
//!
//! - webhooks delivered through a durable broker, routed by the
//!   [`dispatch::Dispatcher`] to one handler per event type, each running in
//!   a single transaction;
//! - periodic GraphQL reconciliation ([`reconcile::Reconciler`]) that walks
//!   cursor-paginated connections, upserts what it sees and prunes what
//!   upstream no longer has.
//!
//! Both feeds write through the idempotent [`processor`]s, keyed by provider
//! ids, so replays and out-of-order deliveries converge.
//!
//! # Features
//!
//! - `sqlite` (default) / `postgres` - database backends.
//! - `migrate` (default) - schema migrations and [`connect_and_migrate`].
//! - `nats` - NATS JetStream message source.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use syncwright::{connect_and_migrate, dispatch::Dispatcher, webhook::HandlerRegistry};
//!
//! let db = connect_and_migrate("sqlite://syncwright.db?mode=rwc").await?;
//! let context = EngineContext::new(db, tenants, tokens, circuits);
//! let registry = Arc::new(HandlerRegistry::standard()?);
//! let dispatcher = Dispatcher::new(context, registry, source, settings.broker);
//! dispatcher.run(shutdown).await?;
//! ```

pub mod context;
pub mod db;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod graphql;
pub mod http;
pub mod payload;
pub mod processor;
pub mod provider;
pub mod rate_limit;
pub mod reconcile;
pub mod retry;
pub mod settings;
pub mod tenant;
pub mod webhook;

#[cfg(feature = "migrate")]
pub mod migration;

pub use context::EngineContext;
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use error::{HandlerFailure, InstallationGoneReason, Result, SyncError};
pub use rate_limit::ApiRateLimiter;
pub use settings::EngineSettings;
pub use tenant::{ScopeFilter, Tenant, TenantDirectory, TenantId};
