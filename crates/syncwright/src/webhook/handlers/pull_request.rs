use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{PullRequestPayload, RepositoryPayload};
use crate::processor::issue::{self, IssueRecord};
use crate::processor::repository;
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

pub struct PullRequestHandler;

#[async_trait]
impl TypedWebhookHandler for PullRequestHandler {
    type Event = PullRequestEvent;

    const EVENT_TYPE: EventType = EventType::PullRequest;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &PullRequestEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &PullRequestEvent,
    ) -> Result<Vec<FollowUp>> {
        let repo = repository::find_or_create(txn, &event.repository).await?;
        issue::upsert(txn, repo.id, &IssueRecord::from(&event.pull_request)).await?;
        tracing::debug!(
            pull_request = event.pull_request.id,
            action = %event.action,
            "pull request synced"
        );
        Ok(Vec::new())
    }
}
