use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{LabelPayload, RepositoryPayload};
use crate::processor::{label, repository};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct LabelEvent {
    pub action: String,
    pub label: LabelPayload,
    pub repository: RepositoryPayload,
}

pub struct LabelHandler;

#[async_trait]
impl TypedWebhookHandler for LabelHandler {
    type Event = LabelEvent;

    const EVENT_TYPE: EventType = EventType::Label;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &LabelEvent) -> bool {
        scope.is_repository_in_scope(&event.repository.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &LabelEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            label::delete(txn, event.label.id).await?;
        } else {
            let repo = repository::find_or_create(txn, &event.repository).await?;
            label::find_or_create(txn, repo.id, &event.label).await?;
        }
        Ok(Vec::new())
    }
}
