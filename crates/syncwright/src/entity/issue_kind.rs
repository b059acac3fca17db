//! Read-side view of an issue row and its optional pull-request detail.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};

use super::{issue, pull_request};

/// Whether an issue row is a plain issue or a pull request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum IssueKind {
    Issue,
    PullRequest(Box<pull_request::Model>),
}

/// An issue together with its kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub issue: issue::Model,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        matches!(self.kind, IssueKind::PullRequest(_))
    }

    pub fn pull_request(&self) -> Option<&pull_request::Model> {
        match &self.kind {
            IssueKind::PullRequest(details) => Some(details),
            IssueKind::Issue => None,
        }
    }

    /// Load an issue and, if present, its pull-request detail row.
    pub async fn load<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let Some(issue) = issue::Entity::find_by_id(id).one(conn).await? else {
            return Ok(None);
        };
        let kind = match pull_request::Entity::find_by_id(id).one(conn).await? {
            Some(details) => IssueKind::PullRequest(Box::new(details)),
            None => IssueKind::Issue,
        };
        Ok(Some(Self { issue, kind }))
    }
}
