use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{MilestonePayload, RepositoryPayload};
use crate::processor::{milestone, repository};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct MilestoneEvent {
    pub action: String,
    pub milestone: MilestonePayload,
    pub repository: RepositoryPayload,
}

pub struct MilestoneHandler;

#[async_trait]
impl TypedWebhookHandler for MilestoneHandler {
    type Event = MilestoneEvent;

    const EVENT_TYPE: EventType = EventType::Milestone;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &MilestoneEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &MilestoneEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            milestone::delete(txn, event.milestone.id).await?;
        } else {
            let repo = repository::find_or_create(txn, &event.repository).await?;
            milestone::find_or_create(txn, repo.id, &event.milestone).await?;
        }
        Ok(Vec::new())
    }
}
