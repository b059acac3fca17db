//! Idempotent entity processors shared by webhook handlers and reconciliation.
//!
//! Every operation is keyed by provider ids and generic over
//! [`sea_orm::ConnectionTrait`], so it runs the same inside an event's
//! transaction or directly on a connection. Two shapes exist:
//!
//! - `find_or_create` / `upsert`: insert on first sight, merge afterwards.
//!   Optional fields are only overwritten by values that are present, so a
//!   minimal reference never blanks data a richer payload filled in.
//! - state transitions (`resolve`, `dismiss`, ...): return `false` and log at
//!   debug level when the row has not been synchronized yet.

pub mod contribution;
pub mod issue;
pub mod issue_link;
pub mod issue_type;
pub mod label;
pub mod milestone;
pub mod organization;
pub mod pull_request;
pub mod repository;
pub mod review;
pub mod review_comment;
pub mod review_thread;
pub mod sync_metadata;
pub mod team;
pub mod user;

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};

use crate::error::{Result, SyncError};

/// Current time in the column representation.
pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

pub(crate) fn to_db_time(value: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    value.map(|v| v.fixed_offset())
}

/// Keep `current` unless `incoming` carries a value.
pub(crate) fn merge<T>(current: Option<T>, incoming: Option<T>) -> Option<T> {
    incoming.or(current)
}

/// Apply a field the source knows authoritatively (`Some(None)` clears it),
/// keeping `current` when the source does not carry the field at all.
pub(crate) fn apply_known<T>(current: Option<T>, incoming: Option<Option<T>>) -> Option<T> {
    match incoming {
        Some(value) => value,
        None => current,
    }
}

/// Fail with [`SyncError::ParentNotFound`] unless the row exists.
pub(crate) async fn require_parent<E, C>(
    conn: &C,
    id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
    entity: &'static str,
) -> Result<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: std::fmt::Display + Clone,
{
    match E::find_by_id(id.clone()).one(conn).await? {
        Some(model) => Ok(model),
        None => Err(SyncError::ParentNotFound {
            entity,
            id: id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_never_regresses_to_none() {
        assert_eq!(merge(Some("Ada"), None), Some("Ada"));
        assert_eq!(merge(Some("Ada"), Some("Grace")), Some("Grace"));
        assert_eq!(merge::<&str>(None, None), None);
    }

    #[test]
    fn apply_known_distinguishes_unknown_from_cleared() {
        assert_eq!(apply_known(Some(3), None), Some(3));
        assert_eq!(apply_known(Some(3), Some(None)), None);
        assert_eq!(apply_known(None, Some(Some(4))), Some(4));
    }
}
