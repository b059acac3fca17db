//! Response shapes for the reconciliation queries.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::payload::{
    IssueTypePayload, RepositoryPayload, ReviewCommentPayload, ReviewPayload, SubIssuesSummary,
    TeamPayload, TeamRefPayload, UserPayload,
};

// ─── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
    #[serde(default)]
    pub page_info: PageInfo,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            page_info: PageInfo::default(),
        }
    }
}

impl<T> Connection<T> {
    /// Whether every node of the connection was returned.
    pub fn is_complete(&self) -> bool {
        !self.page_info.has_next_page
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConnection<E> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<E>,
    #[serde(default)]
    pub page_info: PageInfo,
}

// ─── Shared nodes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ActorNode {
    /// Convert to the webhook shape; bots and ghosts without a numeric id yield `None`.
    pub fn to_payload(&self) -> Option<UserPayload> {
        let id = self.database_id?;
        Some(UserPayload {
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            html_url: self.url.clone(),
            ..UserPayload::reference(id, self.login.clone())
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdNode {
    #[serde(default)]
    pub database_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationNode<C> {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub connection: C,
}

// ─── Issue types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypesData {
    pub organization: Option<OrganizationNode<IssueTypesField>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypesField {
    pub issue_types: Option<Connection<IssueTypeNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypeNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

impl From<&IssueTypeNode> for IssueTypePayload {
    fn from(node: &IssueTypeNode) -> Self {
        Self {
            node_id: node.id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            color: node.color.as_ref().map(|c| c.to_lowercase()),
            is_enabled: node.is_enabled,
        }
    }
}

// ─── Labels ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryData<C> {
    pub repository: Option<RepositoryNode<C>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode<C> {
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(flatten)]
    pub connection: C,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelsField {
    pub labels: Option<Connection<LabelNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelNode {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ─── Teams ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsData {
    pub organization: Option<OrganizationNode<TeamsField>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsField {
    pub teams: Option<Connection<TeamNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_team: Option<IdNode>,
    #[serde(default)]
    pub members: Option<EdgeConnection<TeamMemberEdge>>,
}

impl TeamNode {
    pub fn to_payload(&self) -> Option<TeamPayload> {
        Some(TeamPayload {
            id: self.database_id?,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            privacy: self.privacy.as_ref().map(|p| p.to_lowercase()),
            html_url: self.url.clone(),
            parent: self
                .parent_team
                .and_then(|p| p.database_id)
                .map(|id| TeamRefPayload { id }),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberEdge {
    pub role: String,
    pub node: ActorNode,
}

// ─── Issue relations ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesField {
    pub issues: Option<Connection<IssueRelationNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRelationNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub number: i32,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub sub_issues_summary: Option<SubIssuesSummaryNode>,
    #[serde(default)]
    pub sub_issues: Option<Connection<RelatedIssueNode>>,
    #[serde(default)]
    pub blocked_by: Option<Connection<RelatedIssueNode>>,
}

/// The far end of a relation edge, possibly in another repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedIssueNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub repository: Option<IssueRepositoryNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRepositoryNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub name: String,
    pub name_with_owner: String,
    #[serde(default)]
    pub is_private: Option<bool>,
    pub owner: OwnerNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerNode {
    #[serde(default, rename = "__typename")]
    pub typename: Option<String>,
    pub login: String,
    #[serde(default)]
    pub database_id: Option<i64>,
}

impl IssueRepositoryNode {
    pub fn to_payload(&self) -> Option<RepositoryPayload> {
        let owner_id = self.owner.database_id?;
        Some(RepositoryPayload {
            id: self.database_id?,
            name: self.name.clone(),
            full_name: self.name_with_owner.clone(),
            owner: UserPayload {
                user_type: self.owner.typename.clone(),
                ..UserPayload::reference(owner_id, self.owner.login.clone())
            },
            private: self.is_private,
            visibility: None,
            default_branch: None,
            description: None,
            html_url: None,
            archived: None,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubIssuesSummaryNode {
    pub total: i32,
    pub completed: i32,
    pub percent_completed: i32,
}

impl From<SubIssuesSummaryNode> for SubIssuesSummary {
    fn from(node: SubIssuesSummaryNode) -> Self {
        Self {
            total: node.total,
            completed: node.completed,
            percent_completed: node.percent_completed,
        }
    }
}

// ─── Review threads ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestsField {
    pub pull_requests: Option<Connection<PullRequestThreadsNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestThreadsNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub number: i32,
    #[serde(default)]
    pub review_threads: Option<Connection<ReviewThreadNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewThreadNode {
    pub id: String,
    pub is_resolved: bool,
    #[serde(default)]
    pub resolved_by: Option<ActorNode>,
    #[serde(default)]
    pub comments: Option<Connection<ReviewCommentNode>>,
}

impl ReviewThreadNode {
    /// Id of the first comment, which is also the local thread id.
    pub fn root_comment_id(&self) -> Option<i64> {
        self.comments
            .as_ref()
            .and_then(|c| c.nodes.first())
            .and_then(|n| n.database_id)
    }

    pub fn comment_nodes(&self) -> &[ReviewCommentNode] {
        self.comments.as_ref().map(|c| c.nodes.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub oid: String,
}

/// The review a thread comment belongs to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRefNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    pub state: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<ActorNode>,
}

impl ReviewRefNode {
    pub fn to_payload(&self) -> Option<ReviewPayload> {
        Some(ReviewPayload {
            id: self.database_id?,
            user: self.author.as_ref().and_then(ActorNode::to_payload),
            body: None,
            state: self.state.clone(),
            submitted_at: self.submitted_at,
            commit_id: None,
            html_url: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCommentNode {
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<i32>,
    #[serde(default)]
    pub original_line: Option<i32>,
    #[serde(default)]
    pub start_line: Option<i32>,
    #[serde(default)]
    pub diff_hunk: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<ActorNode>,
    #[serde(default)]
    pub reply_to: Option<IdNode>,
    #[serde(default)]
    pub pull_request_review: Option<ReviewRefNode>,
    #[serde(default)]
    pub commit: Option<CommitNode>,
}

impl ReviewCommentNode {
    /// Convert to the webhook shape; comments without a numeric id yield `None`.
    pub fn to_payload(&self) -> Option<ReviewCommentPayload> {
        Some(ReviewCommentPayload {
            id: self.database_id?,
            pull_request_review_id: self.pull_request_review.as_ref().and_then(|r| r.database_id),
            in_reply_to_id: self.reply_to.and_then(|r| r.database_id),
            user: self.author.as_ref().and_then(ActorNode::to_payload),
            body: self.body.clone(),
            path: self.path.clone(),
            line: self.line,
            original_line: self.original_line,
            start_line: self.start_line,
            side: None,
            commit_id: self.commit.as_ref().map(|c| c.oid.clone()),
            diff_hunk: self.diff_hunk.clone(),
            html_url: self.url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_tolerates_missing_nodes() {
        let conn: Connection<IdNode> = serde_json::from_value(serde_json::json!({
            "pageInfo": {"hasNextPage": false, "endCursor": null}
        }))
        .unwrap();
        assert!(conn.nodes.is_empty());
        assert!(conn.is_complete());
    }

    #[test]
    fn organization_node_flattens_connection() {
        let data: IssueTypesData = serde_json::from_value(serde_json::json!({
            "organization": {
                "databaseId": 3,
                "login": "acme",
                "issueTypes": {
                    "nodes": [{"id": "IT_1", "name": "Bug", "color": "RED", "isEnabled": true}],
                    "pageInfo": {"hasNextPage": true, "endCursor": "Y3Vy"}
                }
            }
        }))
        .unwrap();
        let org = data.organization.unwrap();
        let types = org.connection.issue_types.unwrap();
        assert_eq!(org.database_id, Some(3));
        assert_eq!(types.page_info.end_cursor.as_deref(), Some("Y3Vy"));
        assert_eq!(IssueTypePayload::from(&types.nodes[0]).color.as_deref(), Some("red"));
    }

    #[test]
    fn ghost_actor_has_no_payload() {
        let actor: ActorNode =
            serde_json::from_value(serde_json::json!({"login": "ghost"})).unwrap();
        assert!(actor.to_payload().is_none());
    }

    #[test]
    fn thread_root_is_first_comment() {
        let thread: ReviewThreadNode = serde_json::from_value(serde_json::json!({
            "id": "PRRT_1",
            "isResolved": true,
            "comments": {"nodes": [{"databaseId": 11}], "pageInfo": {"hasNextPage": true}}
        }))
        .unwrap();
        assert_eq!(thread.root_comment_id(), Some(11));
    }

    #[test]
    fn related_issue_carries_its_repository() {
        let node: RelatedIssueNode = serde_json::from_value(serde_json::json!({
            "databaseId": 5,
            "number": 5,
            "title": "Retry budget",
            "state": "OPEN",
            "repository": {
                "databaseId": 11,
                "name": "web",
                "nameWithOwner": "acme/web",
                "owner": {"__typename": "Organization", "login": "acme", "databaseId": 500}
            }
        }))
        .unwrap();
        let repo = node.repository.unwrap().to_payload().unwrap();
        assert_eq!(repo.full_name, "acme/web");
        assert!(repo.is_organization_owned());

        let bare: RelatedIssueNode =
            serde_json::from_value(serde_json::json!({"databaseId": 9})).unwrap();
        assert!(bare.repository.is_none());
    }

    #[test]
    fn thread_comment_converts_to_webhook_shape() {
        let comment: ReviewCommentNode = serde_json::from_value(serde_json::json!({
            "databaseId": 12,
            "body": "nit",
            "path": "src/lib.rs",
            "line": 4,
            "author": {"databaseId": 42, "login": "reviewer"},
            "replyTo": {"databaseId": 11},
            "pullRequestReview": {"databaseId": 1001, "state": "COMMENTED"},
            "commit": {"oid": "abc123"}
        }))
        .unwrap();
        let payload = comment.to_payload().unwrap();
        assert_eq!(payload.in_reply_to_id, Some(11));
        assert_eq!(payload.pull_request_review_id, Some(1001));
        assert_eq!(payload.user.map(|u| u.id), Some(42));
        assert_eq!(payload.commit_id.as_deref(), Some("abc123"));

        let review = comment.pull_request_review.unwrap().to_payload().unwrap();
        assert_eq!(review.id, 1001);
        assert_eq!(review.state, "COMMENTED");
    }
}
