use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::RepositoryPayload;
use crate::processor::repository;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct RepositoryEvent {
    pub action: String,
    pub repository: RepositoryPayload,
    #[serde(default)]
    pub changes: Option<RepositoryChanges>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryChanges {
    #[serde(default)]
    pub repository: Option<RepositoryNameChange>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNameChange {
    pub name: ChangedFrom,
}

#[derive(Debug, Deserialize)]
pub struct ChangedFrom {
    pub from: String,
}

pub struct RepositoryHandler;

#[async_trait]
impl TypedWebhookHandler for RepositoryHandler {
    type Event = RepositoryEvent;

    const EVENT_TYPE: EventType = EventType::Repository;

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &RepositoryEvent,
    ) -> Result<Vec<FollowUp>> {
        let repo = &event.repository;
        match event.action.as_str() {
            "deleted" => {
                if !repository::delete(txn, repo.id).await? {
                    tracing::debug!(repository_id = repo.id, "deleted repository was never synced");
                }
            }
            "renamed" => {
                repository::find_or_create(txn, repo).await?;
                if let Some(old) = event.changes.as_ref().and_then(|c| c.repository.as_ref()) {
                    let old_full_name = format!("{}/{}", repo.owner.login, old.name.from);
                    ctx.tenants.rename_repository(&old_full_name, &repo.full_name);
                }
            }
            _ => {
                repository::find_or_create(txn, repo).await?;
            }
        }
        Ok(Vec::new())
    }
}
