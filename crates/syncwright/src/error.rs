//! Error taxonomy shared by processors, handlers, reconciliation and the dispatcher.
//!
//! Every failure is classified once, where it is created or converted, and the
//! classification travels with it as [`HandlerFailure::retryable`].

use std::fmt;
use std::time::Duration;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::http::HttpError;
use crate::tenant::TenantId;

/// Why an installation can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationGoneReason {
    /// The installation was removed from the account.
    Removed,
    /// The installation is suspended.
    Suspended,
}

impl fmt::Display for InstallationGoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => write!(f, "removed"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// Errors raised by the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required parent row has not been synchronized yet.
    #[error("{entity} {id} not found")]
    ParentNotFound { entity: &'static str, id: String },

    /// Outbound calls for this tenant are failing fast.
    #[error("circuit breaker open for tenant {tenant}")]
    CircuitOpen { tenant: TenantId },

    /// The provider installation backing a tenant is gone.
    #[error("installation {installation_id} is {reason}")]
    InstallationGone {
        installation_id: i64,
        reason: InstallationGoneReason,
    },

    /// The webhook payload does not match the expected shape.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Database error from sea-orm.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// Network-level failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// The provider answered with an unexpected HTTP status.
    #[error("provider responded with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The provider asked us to slow down.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    /// The GraphQL response carried an `errors` array.
    #[error("GraphQL query {query} failed: {}", messages.join("; "))]
    GraphQl { query: String, messages: Vec<String> },

    /// A GraphQL call exceeded its per-call timeout.
    #[error("GraphQL query {query} timed out after {elapsed:?}")]
    Timeout { query: String, elapsed: Duration },

    /// Credentials are missing or could not be used to sign a request.
    #[error("credentials error: {message}")]
    Credentials { message: String },

    /// Data that parsed but violates a domain rule.
    #[error("invalid data: {message}")]
    InvalidData { message: String },
}

impl SyncError {
    /// Create a ParentNotFound error for a numeric provider id.
    pub fn parent_not_found(entity: &'static str, id: i64) -> Self {
        Self::ParentNotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Whether redelivering or re-running the failed operation can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ParentNotFound { .. } => true,
            Self::Database(err) => is_retryable_db_error(err),
            Self::Transport(err) => err.is_transient(),
            Self::UpstreamStatus { status, .. } => *status >= 500,
            Self::RateLimited { .. } | Self::Timeout { .. } => true,
            Self::CircuitOpen { .. }
            | Self::InstallationGone { .. }
            | Self::Payload(_)
            | Self::GraphQl { .. }
            | Self::Credentials { .. }
            | Self::InvalidData { .. } => false,
        }
    }

    /// Whether this error should trip the tenant's circuit breaker.
    pub fn counts_as_outage(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Check if a database error is transient and worth retrying.
///
/// Constraint violations count as transient. Every key is a provider id, so
/// a violation means a concurrent writer raced us and redelivery converges.
pub(crate) fn is_retryable_db_error(err: &DbErr) -> bool {
    if let Some(
        SqlErr::ForeignKeyConstraintViolation(_) | SqlErr::UniqueConstraintViolation(_),
    ) = err.sql_err()
    {
        return true;
    }
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let err_str = err.to_string().to_lowercase();
            // SQLite: database is locked, busy
            // PostgreSQL: connection refused, too many connections
            err_str.contains("locked")
                || err_str.contains("busy")
                || err_str.contains("timeout")
                || err_str.contains("connection")
                || err_str.contains("temporarily unavailable")
        }
        _ => false,
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// A handler failure with its retry classification attached.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct HandlerFailure {
    #[source]
    pub error: SyncError,
    pub retryable: bool,
}

impl HandlerFailure {
    /// Wrap an error that must never be retried regardless of its kind.
    pub fn permanent(error: SyncError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

impl From<SyncError> for HandlerFailure {
    fn from(error: SyncError) -> Self {
        let retryable = error.is_retryable();
        Self { error, retryable }
    }
}

impl From<DbErr> for HandlerFailure {
    fn from(err: DbErr) -> Self {
        SyncError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_not_found_is_retryable() {
        let failure = HandlerFailure::from(SyncError::parent_not_found("pull request", 7));
        assert!(failure.retryable);
        assert_eq!(failure.to_string(), "pull request 7 not found");
    }

    #[test]
    fn payload_errors_are_permanent() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let failure = HandlerFailure::from(SyncError::from(err));
        assert!(!failure.retryable);
    }

    #[test]
    fn installation_gone_is_permanent() {
        let err = SyncError::InstallationGone {
            installation_id: 9,
            reason: InstallationGoneReason::Suspended,
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "installation 9 is suspended");
    }

    #[test]
    fn circuit_open_fails_fast() {
        assert!(!SyncError::CircuitOpen { tenant: 1 }.is_retryable());
    }

    #[test]
    fn server_errors_retry_client_errors_do_not() {
        let server = SyncError::UpstreamStatus {
            status: 502,
            body: String::new(),
        };
        let client = SyncError::UpstreamStatus {
            status: 422,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(server.counts_as_outage());
        assert!(!client.is_retryable());
        assert!(!client.counts_as_outage());
    }

    #[test]
    fn graphql_errors_are_permanent() {
        let err = SyncError::GraphQl {
            query: "IssueTypes".into(),
            messages: vec!["Field 'x' doesn't exist".into(), "second".into()],
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "GraphQL query IssueTypes failed: Field 'x' doesn't exist; second"
        );
    }

    #[test]
    fn transient_db_errors_retry() {
        let locked = DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "database is locked".to_string(),
        ));
        let missing = DbErr::RecordNotFound("x".to_string());
        assert!(SyncError::from(locked).is_retryable());
        assert!(!SyncError::from(missing).is_retryable());
    }

    #[test]
    fn permanent_overrides_classification() {
        let failure = HandlerFailure::permanent(SyncError::RateLimited { retry_after: None });
        assert!(!failure.retryable);
    }
}
