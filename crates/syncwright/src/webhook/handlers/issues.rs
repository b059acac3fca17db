use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{IssuePayload, RepositoryPayload};
use crate::processor::issue;
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

use super::upsert_issue_with_repository;

#[derive(Debug, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: IssuePayload,
    pub repository: RepositoryPayload,
}

/// Every action except `deleted` carries the full issue, so one upsert
/// covers edits, state changes, labeling, assignment and typing.
pub struct IssuesHandler;

#[async_trait]
impl TypedWebhookHandler for IssuesHandler {
    type Event = IssuesEvent;

    const EVENT_TYPE: EventType = EventType::Issues;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &IssuesEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &IssuesEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            issue::delete(txn, event.issue.id).await?;
        } else {
            upsert_issue_with_repository(txn, &event.repository, &event.issue).await?;
        }
        Ok(Vec::new())
    }
}
