//! Provider entity shapes as they appear inside webhook bodies.
//!
//! GraphQL nodes are converted into these same types so both feeds go
//! through one set of processors. Fields the provider may omit are `Option`
//! and tolerate absence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}

impl UserPayload {
    /// A reference carrying only identity.
    pub fn reference(id: i64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            name: None,
            email: None,
            avatar_url: None,
            html_url: None,
            user_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPayload {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPayload {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: UserPayload,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
}

impl RepositoryPayload {
    /// Whether the owner account is an organization.
    pub fn is_organization_owned(&self) -> bool {
        self.owner.user_type.as_deref() == Some("Organization")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPayload {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestonePayload {
    pub id: i64,
    pub number: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypePayload {
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubIssuesSummary {
    pub total: i32,
    pub completed: i32,
    pub percent_completed: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePayload {
    pub id: i64,
    pub number: i32,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub state_reason: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub labels: Option<Vec<LabelPayload>>,
    #[serde(default)]
    pub assignees: Option<Vec<UserPayload>>,
    #[serde(default)]
    pub milestone: Option<MilestonePayload>,
    #[serde(default, rename = "type")]
    pub issue_type: Option<IssueTypePayload>,
    #[serde(default)]
    pub sub_issues_summary: Option<SubIssuesSummary>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub comments: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Present when the issue is the issue-view of a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRefPayload {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestPayload {
    pub id: i64,
    pub number: i32,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub labels: Option<Vec<LabelPayload>>,
    #[serde(default)]
    pub assignees: Option<Vec<UserPayload>>,
    #[serde(default)]
    pub milestone: Option<MilestonePayload>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub comments: Option<i32>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_by: Option<UserPayload>,
    #[serde(default)]
    pub head: Option<GitRefPayload>,
    #[serde(default)]
    pub base: Option<GitRefPayload>,
    #[serde(default)]
    pub additions: Option<i32>,
    #[serde(default)]
    pub deletions: Option<i32>,
    #[serde(default)]
    pub changed_files: Option<i32>,
    #[serde(default)]
    pub commits: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCommentPayload {
    pub id: i64,
    #[serde(default)]
    pub pull_request_review_id: Option<i64>,
    #[serde(default)]
    pub in_reply_to_id: Option<i64>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    pub body: String,
    pub path: String,
    #[serde(default)]
    pub line: Option<i32>,
    #[serde(default)]
    pub original_line: Option<i32>,
    #[serde(default)]
    pub start_line: Option<i32>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub diff_hunk: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewThreadPayload {
    #[serde(default)]
    pub node_id: Option<String>,
    pub comments: Vec<ReviewCommentPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRefPayload {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPayload {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub parent: Option<TeamRefPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationPayload {
    pub id: i64,
    #[serde(default)]
    pub account: Option<UserPayload>,
}

/// Repository entry in `installation_repositories` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationRepositoryPayload {
    pub id: i64,
    pub name: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_payload_tolerates_missing_optional_fields() {
        let issue: IssuePayload = serde_json::from_value(serde_json::json!({
            "id": 1,
            "number": 2,
            "title": "Crash on start",
            "state": "open"
        }))
        .unwrap();
        assert_eq!(issue.body, None);
        assert_eq!(issue.labels, None);
        assert!(issue.pull_request.is_none());
    }

    #[test]
    fn issue_payload_reads_type_and_sub_issue_summary() {
        let issue: IssuePayload = serde_json::from_value(serde_json::json!({
            "id": 1,
            "number": 2,
            "title": "Epic",
            "state": "open",
            "type": {"id": 5, "node_id": "IT_kwDO", "name": "Epic", "color": "purple"},
            "sub_issues_summary": {"total": 4, "completed": 1, "percent_completed": 25}
        }))
        .unwrap();
        assert_eq!(issue.issue_type.unwrap().node_id, "IT_kwDO");
        assert_eq!(issue.sub_issues_summary.unwrap().percent_completed, 25);
    }

    #[test]
    fn organization_owner_detection() {
        let repo: RepositoryPayload = serde_json::from_value(serde_json::json!({
            "id": 10,
            "name": "api",
            "full_name": "acme/api",
            "owner": {"id": 3, "login": "acme", "type": "Organization"}
        }))
        .unwrap();
        assert!(repo.is_organization_owned());
    }
}
