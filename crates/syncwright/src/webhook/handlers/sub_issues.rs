use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::entity::link_type::IssueLinkType;
use crate::error::Result;
use crate::payload::{IssuePayload, RepositoryPayload};
use crate::processor::{issue, issue_link};
use crate::tenant::ScopeFilter;
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

use super::upsert_in_scope_issue;

#[derive(Debug, Deserialize)]
pub struct SubIssuesEvent {
    pub action: String,
    pub parent_issue: IssuePayload,
    pub parent_issue_repo: RepositoryPayload,
    pub sub_issue: IssuePayload,
    pub sub_issue_repo: RepositoryPayload,
}

/// Sub-issue membership changes, reported from either side of the edge.
///
/// Only issues in monitored repositories are stored, and the edge only when
/// both ends are. The parent's counters come from its payload when present,
/// otherwise they are recounted from the stored edges.
pub struct SubIssuesHandler;

#[async_trait]
impl TypedWebhookHandler for SubIssuesHandler {
    type Event = SubIssuesEvent;

    const EVENT_TYPE: EventType = EventType::SubIssues;

    fn in_scope(&self, scope: &dyn ScopeFilter, event: &SubIssuesEvent) -> bool {
        scope.is_repository_in_scope(&event.parent_issue_repo.full_name)
            || scope.is_repository_in_scope(&event.sub_issue_repo.full_name)
    }

    async fn handle_event(
        &self,
        txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &SubIssuesEvent,
    ) -> Result<Vec<FollowUp>> {
        let scope = ctx.tenants.as_ref();
        let parent =
            upsert_in_scope_issue(txn, scope, &event.parent_issue_repo, &event.parent_issue)
                .await?;
        let child =
            upsert_in_scope_issue(txn, scope, &event.sub_issue_repo, &event.sub_issue).await?;

        if let (Some(parent), Some(child)) = (&parent, &child) {
            match event.action.as_str() {
                "sub_issue_added" | "parent_issue_added" => {
                    issue_link::add(txn, parent.id, child.id, IssueLinkType::SubIssue).await?;
                }
                "sub_issue_removed" | "parent_issue_removed" => {
                    issue_link::remove(txn, parent.id, child.id, IssueLinkType::SubIssue).await?;
                }
                other => tracing::debug!(action = other, "sub_issues action ignored"),
            }
        }

        if let Some(parent) = parent
            && event.parent_issue.sub_issues_summary.is_none()
        {
            issue::recount_sub_issues(txn, parent.id).await?;
        }
        Ok(Vec::new())
    }
}
