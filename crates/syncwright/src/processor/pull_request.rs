//! Pull-request detail rows keyed by issue id.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};

use crate::entity::pull_request::{ActiveModel, Entity as PullRequest, Model};
use crate::error::Result;
use crate::payload::{PullRequestPayload, UserPayload};

use super::{merge, now, to_db_time, user};

/// Pull-request specific fields; `None` means the source did not carry the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFields {
    pub is_draft: Option<bool>,
    pub is_merged: Option<bool>,
    pub merged_at: Option<DateTime<Utc>>,
    pub merged_by: Option<UserPayload>,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
    pub head_sha: Option<String>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub changed_files: Option<i32>,
    pub commits: Option<i32>,
}

impl From<&PullRequestPayload> for PullRequestFields {
    fn from(pr: &PullRequestPayload) -> Self {
        Self {
            is_draft: pr.draft,
            is_merged: pr.merged.or(pr.merged_at.map(|_| true)),
            merged_at: pr.merged_at,
            merged_by: pr.merged_by.clone(),
            head_ref: pr.head.as_ref().map(|h| h.ref_name.clone()),
            base_ref: pr.base.as_ref().map(|b| b.ref_name.clone()),
            head_sha: pr.head.as_ref().and_then(|h| h.sha.clone()),
            additions: pr.additions,
            deletions: pr.deletions,
            changed_files: pr.changed_files,
            commits: pr.commits,
        }
    }
}

/// Insert or merge the detail row. The issue row must already exist.
pub(crate) async fn upsert_details<C: ConnectionTrait>(
    conn: &C,
    issue_id: i64,
    fields: &PullRequestFields,
) -> Result<Model> {
    let merged_by_id = user::upsert_ref(conn, fields.merged_by.as_ref()).await?;

    let Some(current) = PullRequest::find_by_id(issue_id).one(conn).await? else {
        let model = ActiveModel {
            issue_id: Set(issue_id),
            is_draft: Set(fields.is_draft.unwrap_or(false)),
            is_merged: Set(fields.is_merged.unwrap_or(false)),
            merged_at: Set(to_db_time(fields.merged_at)),
            merged_by_id: Set(merged_by_id),
            head_ref: Set(fields.head_ref.clone()),
            base_ref: Set(fields.base_ref.clone()),
            head_sha: Set(fields.head_sha.clone()),
            additions: Set(fields.additions),
            deletions: Set(fields.deletions),
            changed_files: Set(fields.changed_files),
            commits: Set(fields.commits),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    if let Some(draft) = fields.is_draft {
        active.is_draft = Set(draft);
    }
    if let Some(merged) = fields.is_merged {
        active.is_merged = Set(merged);
    }
    active.merged_at = Set(merge(current.merged_at, to_db_time(fields.merged_at)));
    active.merged_by_id = Set(merge(current.merged_by_id, merged_by_id));
    active.head_ref = Set(merge(current.head_ref, fields.head_ref.clone()));
    active.base_ref = Set(merge(current.base_ref, fields.base_ref.clone()));
    active.head_sha = Set(merge(current.head_sha, fields.head_sha.clone()));
    active.additions = Set(merge(current.additions, fields.additions));
    active.deletions = Set(merge(current.deletions, fields.deletions));
    active.changed_files = Set(merge(current.changed_files, fields.changed_files));
    active.commits = Set(merge(current.commits, fields.commits));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}
