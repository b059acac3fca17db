use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{OrganizationPayload, UserPayload};
use crate::processor::{organization, user};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct OrganizationEvent {
    pub action: String,
    pub organization: OrganizationPayload,
    #[serde(default)]
    pub membership: Option<OrganizationMembership>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationMembership {
    pub user: UserPayload,
}

pub struct OrganizationHandler;

#[async_trait]
impl TypedWebhookHandler for OrganizationHandler {
    type Event = OrganizationEvent;

    const EVENT_TYPE: EventType = EventType::Organization;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &OrganizationEvent) -> bool {
        scope.is_organization_in_scope(&event.organization.login)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &OrganizationEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.action == "deleted" {
            organization::delete(txn, event.organization.id).await?;
            return Ok(Vec::new());
        }
        organization::find_or_create(txn, &event.organization).await?;
        if event.action == "member_added"
            && let Some(membership) = &event.membership
        {
            user::find_or_create(txn, &membership.user).await?;
        }
        Ok(Vec::new())
    }
}
