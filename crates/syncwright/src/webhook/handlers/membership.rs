use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::entity::team_role::TeamRole;
use crate::error::Result;
use crate::payload::{OrganizationPayload, TeamPayload, UserPayload};
use crate::processor::{organization, team};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct MembershipEvent {
    pub action: String,
    pub scope: String,
    pub member: UserPayload,
    pub team: TeamPayload,
    pub organization: OrganizationPayload,
}

/// Team membership changes. The event carries no role, so new members are
/// recorded as plain members and existing roles are kept.
pub struct MembershipHandler;

#[async_trait]
impl TypedWebhookHandler for MembershipHandler {
    type Event = MembershipEvent;

    const EVENT_TYPE: EventType = EventType::Membership;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &MembershipEvent) -> bool {
        scope.is_organization_in_scope(&event.organization.login)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        _ctx: &EngineContext,
        event: &MembershipEvent,
    ) -> Result<Vec<FollowUp>> {
        if event.scope != "team" {
            return Ok(Vec::new());
        }
        match event.action.as_str() {
            "added" => {
                let org = organization::find_or_create(txn, &event.organization).await?;
                let stored = team::find_or_create(txn, org.id, &event.team).await?;
                team::ensure_member(txn, stored.id, &event.member, TeamRole::Member).await?;
            }
            "removed" => {
                team::remove_member(txn, event.team.id, event.member.id).await?;
            }
            other => tracing::debug!(action = other, "membership action ignored"),
        }
        Ok(Vec::new())
    }
}
