use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::entity::link_type::IssueLinkType;
use crate::error::Result;
use crate::payload::{IssuePayload, RepositoryPayload};
use crate::processor::issue_link;
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

use super::upsert_in_scope_issue;

#[derive(Debug, Deserialize)]
pub struct IssueDependenciesEvent {
    pub action: String,
    pub blocked_issue: IssuePayload,
    #[serde(default)]
    pub blocked_issue_repo: Option<RepositoryPayload>,
    pub blocking_issue: IssuePayload,
    #[serde(default)]
    pub blocking_issue_repo: Option<RepositoryPayload>,
    pub repository: RepositoryPayload,
}

impl IssueDependenciesEvent {
    fn blocked_repo(&self) -> &RepositoryPayload {
        self.blocked_issue_repo.as_ref().unwrap_or(&self.repository)
    }

    fn blocking_repo(&self) -> &RepositoryPayload {
        self.blocking_issue_repo.as_ref().unwrap_or(&self.repository)
    }
}

/// Dependency edges, stored as `depends_on` plus the inverse `blocks`.
///
/// An issue in an unmonitored repository is never stored, so an edge to it
/// is skipped.
pub struct IssueDependenciesHandler;

#[async_trait]
impl TypedWebhookHandler for IssueDependenciesHandler {
    type Event = IssueDependenciesEvent;

    const EVENT_TYPE: EventType = EventType::IssueDependencies;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &IssueDependenciesEvent) -> bool {
        scope.is_repository_in_scope(&event.blocked_repo().full_name)
            || scope.is_repository_in_scope(&event.blocking_repo().full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &IssueDependenciesEvent,
    ) -> Result<Vec<FollowUp>> {
        let scope = ctx.tenants.as_ref();
        let blocked =
            upsert_in_scope_issue(txn, scope, event.blocked_repo(), &event.blocked_issue).await?;
        let blocking =
            upsert_in_scope_issue(txn, scope, event.blocking_repo(), &event.blocking_issue).await?;
        let (Some(blocked), Some(blocking)) = (blocked, blocking) else {
            return Ok(Vec::new());
        };

        match event.action.as_str() {
            "blocked_by_added" | "blocking_added" => {
                issue_link::add(txn, blocked.id, blocking.id, IssueLinkType::DependsOn).await?;
            }
            "blocked_by_removed" | "blocking_removed" => {
                issue_link::remove(txn, blocked.id, blocking.id, IssueLinkType::DependsOn).await?;
            }
            other => tracing::debug!(action = other, "issue_dependencies action ignored"),
        }
        Ok(Vec::new())
    }
}
