use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::entity::contribution_source::ContributionSource;
use crate::entity::state::ReviewState;
use crate::error::Result;
use crate::payload::{PullRequestPayload, RepositoryPayload, ReviewPayload};
use crate::processor::contribution::ContributionRecord;
use crate::processor::issue::{self, IssueRecord};
use crate::processor::{repository, review};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: String,
    pub review: ReviewPayload,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

/// Stores reviews and records a contribution for each submitted review.
pub struct PullRequestReviewHandler;

#[async_trait]
impl TypedWebhookHandler for PullRequestReviewHandler {
    type Event = PullRequestReviewEvent;

    const EVENT_TYPE: EventType = EventType::PullRequestReview;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &PullRequestReviewEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &PullRequestReviewEvent,
    ) -> Result<Vec<FollowUp>> {
        let repo = repository::find_or_create(txn, &event.repository).await?;
        let pull_request =
            issue::upsert(txn, repo.id, &IssueRecord::from(&event.pull_request)).await?;
        let stored = review::upsert(txn, pull_request.id, &event.review).await?;

        if event.action == "dismissed" {
            review::dismiss(txn, stored.id).await?;
            return Ok(Vec::new());
        }

        let contribution = match (&event.review.user, stored.state) {
            (_, ReviewState::Pending | ReviewState::Dismissed) | (None, _) => None,
            (Some(author), _) => Some(ContributionRecord {
                source: ContributionSource::PullRequestReview,
                source_id: stored.id,
                actor_id: author.id,
                repository_id: Some(repo.id),
                occurred_at: event.review.submitted_at.unwrap_or_else(Utc::now),
            }),
        };
        Ok(contribution
            .map(FollowUp::RecordContribution)
            .into_iter()
            .collect())
    }
}
