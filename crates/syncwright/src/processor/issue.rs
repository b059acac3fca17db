//! Issues and pull requests.
//!
//! Both arrive as an [`IssueRecord`]; the record's [`RecordKind`] decides
//! whether a pull-request detail row is written alongside the issue row.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entity::issue::{ActiveModel, Column, Entity as Issue, Model};
use crate::entity::issue_kind;
use crate::entity::link_type::IssueLinkType;
use crate::entity::state::IssueState;
use crate::entity::{issue_assignee, issue_label, repository};
use crate::error::Result;
use crate::payload::{
    IssuePayload, IssueTypePayload, LabelPayload, MilestonePayload, PullRequestPayload,
    SubIssuesSummary, UserPayload,
};

use super::pull_request::{self, PullRequestFields};
use super::{
    apply_known, issue_link, issue_type, label, merge, milestone, now, require_parent, to_db_time,
    user,
};

/// Whether a record describes a plain issue or a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Issue,
    PullRequest(PullRequestFields),
}

/// Normalized issue data from a webhook payload or a GraphQL node.
///
/// `Option<Option<T>>` fields separate "not carried by this source" (`None`)
/// from "carried and empty" (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub id: i64,
    pub number: i32,
    pub title: String,
    pub state: IssueState,
    pub body: Option<Option<String>>,
    pub state_reason: Option<Option<String>>,
    pub html_url: Option<String>,
    pub author: Option<UserPayload>,
    pub labels: Option<Vec<LabelPayload>>,
    pub assignees: Option<Vec<UserPayload>>,
    pub milestone: Option<Option<MilestonePayload>>,
    pub issue_type: Option<Option<IssueTypePayload>>,
    pub sub_issues: Option<SubIssuesSummary>,
    pub is_locked: Option<bool>,
    pub comments_count: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<Option<DateTime<Utc>>>,
    pub kind: RecordKind,
}

impl IssueRecord {
    /// A reference carrying only identity, title and state.
    pub fn minimal(id: i64, number: i32, title: impl Into<String>, state: IssueState) -> Self {
        Self {
            id,
            number,
            title: title.into(),
            state,
            body: None,
            state_reason: None,
            html_url: None,
            author: None,
            labels: None,
            assignees: None,
            milestone: None,
            issue_type: None,
            sub_issues: None,
            is_locked: None,
            comments_count: None,
            created_at: None,
            updated_at: None,
            closed_at: None,
            kind: RecordKind::Issue,
        }
    }
}

impl From<&IssuePayload> for IssueRecord {
    fn from(issue: &IssuePayload) -> Self {
        let kind = if issue.pull_request.is_some() {
            RecordKind::PullRequest(PullRequestFields::default())
        } else {
            RecordKind::Issue
        };
        Self {
            id: issue.id,
            number: issue.number,
            title: issue.title.clone(),
            state: IssueState::parse(&issue.state),
            body: Some(issue.body.clone()),
            state_reason: Some(issue.state_reason.clone()),
            html_url: issue.html_url.clone(),
            author: issue.user.clone(),
            labels: issue.labels.clone(),
            assignees: issue.assignees.clone(),
            milestone: Some(issue.milestone.clone()),
            issue_type: Some(issue.issue_type.clone()),
            sub_issues: issue.sub_issues_summary,
            is_locked: issue.locked,
            comments_count: issue.comments,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: Some(issue.closed_at),
            kind,
        }
    }
}

impl From<&PullRequestPayload> for IssueRecord {
    fn from(pr: &PullRequestPayload) -> Self {
        Self {
            id: pr.id,
            number: pr.number,
            title: pr.title.clone(),
            state: IssueState::parse(&pr.state),
            body: Some(pr.body.clone()),
            state_reason: None,
            html_url: pr.html_url.clone(),
            author: pr.user.clone(),
            labels: pr.labels.clone(),
            assignees: pr.assignees.clone(),
            milestone: Some(pr.milestone.clone()),
            issue_type: None,
            sub_issues: None,
            is_locked: pr.locked,
            comments_count: pr.comments,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            closed_at: Some(pr.closed_at),
            kind: RecordKind::PullRequest(PullRequestFields::from(pr)),
        }
    }
}

/// Insert or merge an issue (and its pull-request detail, labels and assignees).
pub async fn upsert<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
    record: &IssueRecord,
) -> Result<Model> {
    let repo = require_parent::<repository::Entity, _>(conn, repository_id, "repository").await?;

    let author_id = user::upsert_ref(conn, record.author.as_ref()).await?;
    let milestone_id = match &record.milestone {
        Some(Some(m)) => Some(Some(milestone::find_or_create(conn, repository_id, m).await?.id)),
        Some(None) => Some(None),
        None => None,
    };
    let issue_type_id = match (&record.issue_type, repo.organization_id) {
        (Some(Some(t)), Some(org_id)) => {
            Some(Some(issue_type::find_or_create(conn, org_id, t).await?.id))
        }
        (Some(Some(t)), None) => {
            tracing::debug!(
                issue = record.id,
                issue_type = %t.name,
                "issue type on user-owned repository ignored"
            );
            None
        }
        (Some(None), _) => Some(None),
        (None, _) => None,
    };

    let existing = Issue::find_by_id(record.id).one(conn).await?;
    let model = match existing {
        None => {
            let summary = record.sub_issues.unwrap_or(SubIssuesSummary {
                total: 0,
                completed: 0,
                percent_completed: 0,
            });
            ActiveModel {
                id: Set(record.id),
                repository_id: Set(repository_id),
                number: Set(record.number),
                title: Set(record.title.clone()),
                body: Set(record.body.clone().flatten()),
                html_url: Set(record.html_url.clone()),
                state: Set(record.state),
                state_reason: Set(record.state_reason.clone().flatten()),
                is_locked: Set(record.is_locked.unwrap_or(false)),
                comments_count: Set(record.comments_count.unwrap_or(0)),
                author_id: Set(author_id),
                milestone_id: Set(milestone_id.flatten()),
                issue_type_id: Set(issue_type_id.flatten()),
                sub_issues_total: Set(summary.total),
                sub_issues_completed: Set(summary.completed),
                sub_issues_percent_completed: Set(summary.percent_completed),
                created_at: Set(to_db_time(record.created_at)),
                updated_at: Set(to_db_time(record.updated_at)),
                closed_at: Set(to_db_time(record.closed_at.flatten())),
                synced_at: Set(now()),
            }
            .insert(conn)
            .await?
        }
        Some(current) => {
            let mut active = current.clone().into_active_model();
            // Transferred issues keep their id but move repositories
            active.repository_id = Set(repository_id);
            active.number = Set(record.number);
            active.title = Set(record.title.clone());
            active.state = Set(record.state);
            active.body = Set(apply_known(current.body, record.body.clone()));
            active.state_reason =
                Set(apply_known(current.state_reason, record.state_reason.clone()));
            active.html_url = Set(merge(current.html_url, record.html_url.clone()));
            active.author_id = Set(merge(current.author_id, author_id));
            active.milestone_id = Set(apply_known(current.milestone_id, milestone_id));
            active.issue_type_id = Set(apply_known(current.issue_type_id, issue_type_id));
            if let Some(locked) = record.is_locked {
                active.is_locked = Set(locked);
            }
            if let Some(count) = record.comments_count {
                active.comments_count = Set(count);
            }
            if let Some(summary) = record.sub_issues {
                active.sub_issues_total = Set(summary.total);
                active.sub_issues_completed = Set(summary.completed);
                active.sub_issues_percent_completed = Set(summary.percent_completed);
            }
            active.created_at = Set(merge(current.created_at, to_db_time(record.created_at)));
            active.updated_at = Set(merge(current.updated_at, to_db_time(record.updated_at)));
            active.closed_at = Set(apply_known(
                current.closed_at,
                record.closed_at.map(to_db_time),
            ));
            active.synced_at = Set(now());
            active.update(conn).await?
        }
    };

    if let Some(labels) = &record.labels {
        let mut label_ids = HashSet::with_capacity(labels.len());
        for payload in labels {
            label_ids.insert(label::find_or_create(conn, repository_id, payload).await?.id);
        }
        replace_labels(conn, model.id, &label_ids).await?;
    }

    if let Some(assignees) = &record.assignees {
        let mut user_ids = HashSet::with_capacity(assignees.len());
        for payload in assignees {
            user_ids.insert(user::find_or_create(conn, payload).await?.id);
        }
        replace_assignees(conn, model.id, &user_ids).await?;
    }

    if let RecordKind::PullRequest(fields) = &record.kind {
        pull_request::upsert_details(conn, model.id, fields).await?;
    }

    Ok(model)
}

async fn replace_labels<C: ConnectionTrait>(
    conn: &C,
    issue_id: i64,
    label_ids: &HashSet<i64>,
) -> Result<()> {
    issue_label::Entity::delete_many()
        .filter(issue_label::Column::IssueId.eq(issue_id))
        .filter(issue_label::Column::LabelId.is_not_in(label_ids.iter().copied()))
        .exec(conn)
        .await?;

    let present: HashSet<i64> = issue_label::Entity::find()
        .filter(issue_label::Column::IssueId.eq(issue_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.label_id)
        .collect();

    for label_id in label_ids.difference(&present) {
        issue_label::ActiveModel {
            issue_id: Set(issue_id),
            label_id: Set(*label_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn replace_assignees<C: ConnectionTrait>(
    conn: &C,
    issue_id: i64,
    user_ids: &HashSet<i64>,
) -> Result<()> {
    issue_assignee::Entity::delete_many()
        .filter(issue_assignee::Column::IssueId.eq(issue_id))
        .filter(issue_assignee::Column::UserId.is_not_in(user_ids.iter().copied()))
        .exec(conn)
        .await?;

    let present: HashSet<i64> = issue_assignee::Entity::find()
        .filter(issue_assignee::Column::IssueId.eq(issue_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| row.user_id)
        .collect();

    for user_id in user_ids.difference(&present) {
        issue_assignee::ActiveModel {
            issue_id: Set(issue_id),
            user_id: Set(*user_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Refresh a parent's sub-issue counters. Returns `false` if the issue is not synced yet.
pub async fn update_sub_issue_summary<C: ConnectionTrait>(
    conn: &C,
    issue_id: i64,
    summary: SubIssuesSummary,
) -> Result<bool> {
    let Some(current) = Issue::find_by_id(issue_id).one(conn).await? else {
        tracing::debug!(issue_id, "sub-issue summary for unsynced issue skipped");
        return Ok(false);
    };
    let mut active = current.into_active_model();
    active.sub_issues_total = Set(summary.total);
    active.sub_issues_completed = Set(summary.completed);
    active.sub_issues_percent_completed = Set(summary.percent_completed);
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

/// Recompute a parent's sub-issue counters from the stored sub-issue edges.
pub async fn recount_sub_issues<C: ConnectionTrait>(conn: &C, issue_id: i64) -> Result<bool> {
    let children = issue_link::targets(conn, issue_id, IssueLinkType::SubIssue).await?;
    let completed = if children.is_empty() {
        0
    } else {
        Issue::find()
            .filter(Column::Id.is_in(children.iter().copied()))
            .filter(Column::State.eq(IssueState::Closed))
            .count(conn)
            .await?
    };
    let total = i32::try_from(children.len()).unwrap_or(i32::MAX);
    let completed = i32::try_from(completed).unwrap_or(i32::MAX);
    let percent_completed = if total == 0 { 0 } else { completed * 100 / total };
    update_sub_issue_summary(
        conn,
        issue_id,
        SubIssuesSummary {
            total,
            completed,
            percent_completed,
        },
    )
    .await
}

/// Delete an issue; detail rows, labels, assignees and links cascade.
pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Issue::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

/// Load the issue together with its kind.
pub async fn find<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<issue_kind::Issue>> {
    Ok(issue_kind::Issue::load(conn, id).await?)
}
