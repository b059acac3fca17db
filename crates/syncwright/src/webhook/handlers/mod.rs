//! One handler per supported event type.

mod installation;
mod installation_repositories;
mod issue_dependencies;
mod issues;
mod label;
mod membership;
mod milestone;
mod organization;
mod pull_request;
mod pull_request_review;
mod pull_request_review_comment;
mod pull_request_review_thread;
mod repository;
mod sub_issues;
mod team;

pub use installation::InstallationHandler;
pub use installation_repositories::InstallationRepositoriesHandler;
pub use issue_dependencies::IssueDependenciesHandler;
pub use issues::IssuesHandler;
pub use label::LabelHandler;
pub use membership::MembershipHandler;
pub use milestone::MilestoneHandler;
pub use organization::OrganizationHandler;
pub use pull_request::PullRequestHandler;
pub use pull_request_review::PullRequestReviewHandler;
pub use pull_request_review_comment::PullRequestReviewCommentHandler;
pub use pull_request_review_thread::PullRequestReviewThreadHandler;
pub use repository::RepositoryHandler;
pub use sub_issues::SubIssuesHandler;
pub use team::TeamHandler;

use sea_orm::ConnectionTrait;

use crate::entity::repository as repository_entity;
use crate::error::Result;
use crate::payload::{IssuePayload, RepositoryPayload};
use crate::processor::issue::{self, IssueRecord};
use crate::tenant::ScopeFilter;

/// Upsert an issue together with the repository carried next to it.
pub(crate) async fn upsert_issue_with_repository<C: ConnectionTrait>(
    conn: &C,
    repository: &RepositoryPayload,
    payload: &IssuePayload,
) -> Result<(repository_entity::Model, crate::entity::issue::Model)> {
    let repo = crate::processor::repository::find_or_create(conn, repository).await?;
    let issue = issue::upsert(conn, repo.id, &IssueRecord::from(payload)).await?;
    Ok((repo, issue))
}

/// Upsert an issue only if its repository is monitored by some tenant.
pub(crate) async fn upsert_in_scope_issue<C: ConnectionTrait>(
    conn: &C,
    scope: &dyn ScopeFilter,
    repository: &RepositoryPayload,
    payload: &IssuePayload,
) -> Result<Option<crate::entity::issue::Model>> {
    if !scope.is_repository_in_scope(&repository.full_name) {
        tracing::debug!(
            repository = %repository.full_name,
            issue_id = payload.id,
            "issue outside monitored scope not stored"
        );
        return Ok(None);
    }
    let (_, issue) = upsert_issue_with_repository(conn, repository, payload).await?;
    Ok(Some(issue))
}
