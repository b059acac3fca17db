use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::{Result, SyncError};
use crate::payload::{RepositoryPayload, ReviewThreadPayload, UserPayload};
use crate::processor::{review_thread, user};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct PullRequestReviewThreadEvent {
    pub action: String,
    pub thread: ReviewThreadPayload,
    pub repository: RepositoryPayload,
    #[serde(default)]
    pub sender: Option<UserPayload>,
}

/// Applies resolve/unresolve transitions.
///
/// A thread that is not synchronized yet is treated as a missing parent so
/// the event is redelivered once its root comment has arrived.
pub struct PullRequestReviewThreadHandler;

#[async_trait]
impl TypedWebhookHandler for PullRequestReviewThreadHandler {
    type Event = PullRequestReviewThreadEvent;

    const EVENT_TYPE: EventType = EventType::PullRequestReviewThread;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &PullRequestReviewThreadEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &PullRequestReviewThreadEvent,
    ) -> Result<Vec<FollowUp>> {
        let thread_id = review_thread::root_comment_id(&event.thread)
            .ok_or_else(|| SyncError::invalid_data("review thread event without comments"))?;

        let found = match event.action.as_str() {
            "resolved" => {
                let resolver = user::upsert_ref(txn, event.sender.as_ref()).await?;
                review_thread::resolve(txn, thread_id, resolver, Utc::now()).await?
            }
            "unresolved" => review_thread::unresolve(txn, thread_id).await?,
            other => {
                tracing::debug!(action = other, "review thread action ignored");
                return Ok(Vec::new());
            }
        };
        if !found {
            return Err(SyncError::parent_not_found("review thread", thread_id));
        }
        if let Some(node_id) = &event.thread.node_id {
            review_thread::set_node_id(txn, thread_id, node_id).await?;
        }
        Ok(Vec::new())
    }
}
