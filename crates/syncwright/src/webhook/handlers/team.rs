use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{OrganizationPayload, TeamPayload};
use crate::processor::{organization, team};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct TeamEvent {
    pub action: String,
    pub team: TeamPayload,
    pub organization: OrganizationPayload,
}

pub struct TeamHandler;

#[async_trait]
impl TypedWebhookHandler for TeamHandler {
    type Event = TeamEvent;

    const EVENT_TYPE: EventType = EventType::Team;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &TeamEvent) -> bool {
        scope.is_organization_in_scope(&event.organization.login)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &TeamEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            team::delete(txn, event.team.id).await?;
        } else {
            let org = organization::find_or_create(txn, &event.organization).await?;
            team::find_or_create(txn, org.id, &event.team).await?;
        }
        Ok(Vec::new())
    }
}
