use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{PullRequestPayload, RepositoryPayload, ReviewCommentPayload};
use crate::processor::issue::{self, IssueRecord};
use crate::processor::{repository, review_comment};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: String,
    pub comment: ReviewCommentPayload,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

/// Replies arriving before their parent, or comments before their review,
/// fail with a retryable parent-not-found.
pub struct PullRequestReviewCommentHandler;

#[async_trait]
impl TypedWebhookHandler for PullRequestReviewCommentHandler {
    type Event = PullRequestReviewCommentEvent;

    const EVENT_TYPE: EventType = EventType::PullRequestReviewComment;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &PullRequestReviewCommentEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &PullRequestReviewCommentEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            review_comment::delete(txn, event.comment.id).await?;
            return Ok(Vec::new());
        }
        let repo = repository::find_or_create(txn, &event.repository).await?;
        let pull_request =
            issue::upsert(txn, repo.id, &IssueRecord::from(&event.pull_request)).await?;
        review_comment::upsert(txn, pull_request.id, &event.comment).await?;
        Ok(Vec::new())
    }
}
