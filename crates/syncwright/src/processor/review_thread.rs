//! Review thread state machine.
//!
//! ```text
//! UNRESOLVED --resolve(by, at)--> RESOLVED --unresolve--> UNRESOLVED
//! ```
//!
//! A thread's id is the id of its root comment. Transitions are idempotent
//! and report whether the thread was found.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::pull_request_review_thread::{ActiveModel, Column, Entity as Thread, Model};
use crate::entity::state::ThreadState;
use crate::entity::pull_request_review_comment;
use crate::error::Result;
use crate::payload::{ReviewCommentPayload, ReviewThreadPayload};

use super::now;

/// Id of the thread's root comment: the comment that replies to nothing,
/// falling back to the lowest id.
pub fn root_comment_id(thread: &ReviewThreadPayload) -> Option<i64> {
    thread
        .comments
        .iter()
        .filter(|c| c.in_reply_to_id.is_none())
        .map(|c| c.id)
        .min()
        .or_else(|| thread.comments.iter().map(|c| c.id).min())
}

/// Create the thread rooted at `root` if it does not exist yet.
pub(crate) async fn find_or_create_for_root<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
    root: &ReviewCommentPayload,
) -> Result<Model> {
    if let Some(existing) = Thread::find_by_id(root.id).one(conn).await? {
        return Ok(existing);
    }
    let model = ActiveModel {
        id: Set(root.id),
        pull_request_id: Set(pull_request_id),
        state: Set(ThreadState::Unresolved),
        resolved_by_id: Set(None),
        resolved_at: Set(None),
        path: Set(Some(root.path.clone())),
        line: Set(root.line.or(root.original_line)),
        node_id: Set(None),
        synced_at: Set(now()),
    };
    Ok(model.insert(conn).await?)
}

/// Mark a thread resolved by `resolver` at `at`.
///
/// Resolving an already-resolved thread keeps the original resolver and time.
pub async fn resolve<C: ConnectionTrait>(
    conn: &C,
    thread_id: i64,
    resolver_id: Option<i64>,
    at: DateTime<Utc>,
) -> Result<bool> {
    let Some(current) = Thread::find_by_id(thread_id).one(conn).await? else {
        tracing::debug!(thread_id, "resolve for unsynced thread skipped");
        return Ok(false);
    };
    if current.state == ThreadState::Resolved {
        return Ok(true);
    }
    let mut active = current.into_active_model();
    active.state = Set(ThreadState::Resolved);
    active.resolved_by_id = Set(resolver_id);
    active.resolved_at = Set(Some(at.fixed_offset()));
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

/// Mark a thread unresolved, clearing resolver and time.
pub async fn unresolve<C: ConnectionTrait>(conn: &C, thread_id: i64) -> Result<bool> {
    let Some(current) = Thread::find_by_id(thread_id).one(conn).await? else {
        tracing::debug!(thread_id, "unresolve for unsynced thread skipped");
        return Ok(false);
    };
    let mut active = current.into_active_model();
    active.state = Set(ThreadState::Unresolved);
    active.resolved_by_id = Set(None);
    active.resolved_at = Set(None);
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

/// Record the GraphQL node id. Returns `false` if the thread is not synced yet.
pub async fn set_node_id<C: ConnectionTrait>(
    conn: &C,
    thread_id: i64,
    node_id: &str,
) -> Result<bool> {
    let Some(current) = Thread::find_by_id(thread_id).one(conn).await? else {
        return Ok(false);
    };
    if current.node_id.as_deref() == Some(node_id) {
        return Ok(true);
    }
    let mut active = current.into_active_model();
    active.node_id = Set(Some(node_id.to_string()));
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

/// Move a thread onto a new root comment after its root was deleted.
///
/// Copies the thread under `new_root_id`, points every remaining comment at
/// it and removes the old row.
pub(crate) async fn re_anchor<C: ConnectionTrait>(
    conn: &C,
    thread: Model,
    new_root_id: i64,
) -> Result<Model> {
    let old_id = thread.id;
    let moved = ActiveModel {
        id: Set(new_root_id),
        pull_request_id: Set(thread.pull_request_id),
        state: Set(thread.state),
        resolved_by_id: Set(thread.resolved_by_id),
        resolved_at: Set(thread.resolved_at),
        path: Set(thread.path),
        line: Set(thread.line),
        node_id: Set(thread.node_id),
        synced_at: Set(now()),
    }
    .insert(conn)
    .await?;

    pull_request_review_comment::Entity::update_many()
        .col_expr(
            pull_request_review_comment::Column::ThreadId,
            sea_orm::sea_query::Expr::value(new_root_id),
        )
        .filter(pull_request_review_comment::Column::ThreadId.eq(old_id))
        .exec(conn)
        .await?;

    Thread::delete_by_id(old_id).exec(conn).await?;
    tracing::debug!(old_thread = old_id, new_thread = new_root_id, "review thread re-anchored");
    Ok(moved)
}

pub async fn list_for_pull_request<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
) -> Result<Vec<Model>> {
    Ok(Thread::find()
        .filter(Column::PullRequestId.eq(pull_request_id))
        .all(conn)
        .await?)
}

/// Delete threads (and their comments) of a pull request that are not in `seen`.
pub async fn prune<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
    seen: &HashSet<i64>,
) -> Result<u64> {
    let res = Thread::delete_many()
        .filter(Column::PullRequestId.eq(pull_request_id))
        .filter(Column::Id.is_not_in(seen.iter().copied()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, in_reply_to_id: Option<i64>) -> ReviewCommentPayload {
        ReviewCommentPayload {
            id,
            pull_request_review_id: None,
            in_reply_to_id,
            user: None,
            body: String::new(),
            path: "src/lib.rs".into(),
            line: Some(1),
            original_line: None,
            start_line: None,
            side: None,
            commit_id: None,
            diff_hunk: None,
            html_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn root_is_the_comment_that_replies_to_nothing() {
        let thread = ReviewThreadPayload {
            node_id: None,
            comments: vec![comment(30, Some(20)), comment(20, None), comment(10, Some(99))],
        };
        assert_eq!(root_comment_id(&thread), Some(20));
    }

    #[test]
    fn root_falls_back_to_lowest_id() {
        let thread = ReviewThreadPayload {
            node_id: None,
            comments: vec![comment(31, Some(5)), comment(30, Some(5))],
        };
        assert_eq!(root_comment_id(&thread), Some(30));
        let empty = ReviewThreadPayload {
            node_id: None,
            comments: Vec::new(),
        };
        assert_eq!(root_comment_id(&empty), None);
    }
}
