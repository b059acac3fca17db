//! Issue entity - columns shared by issues and pull requests.
//!
//! Pull-request specifics live in [`super::pull_request`], keyed by the same id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::state::IssueState;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    /// Provider numeric id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub repository_id: i64,
    pub number: i32,

    // ─── Content ─────────────────────────────────────────────────────────────
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,

    // ─── State ───────────────────────────────────────────────────────────────
    pub state: IssueState,
    /// `completed`, `not_planned`, `reopened` or `duplicate`.
    pub state_reason: Option<String>,
    #[sea_orm(default_value = false)]
    pub is_locked: bool,
    #[sea_orm(default_value = 0)]
    pub comments_count: i32,

    // ─── References ──────────────────────────────────────────────────────────
    pub author_id: Option<i64>,
    pub milestone_id: Option<i64>,
    /// Issue type node id.
    pub issue_type_id: Option<String>,

    // ─── Sub-issue Aggregates ────────────────────────────────────────────────
    #[sea_orm(default_value = 0)]
    pub sub_issues_total: i32,
    #[sea_orm(default_value = 0)]
    pub sub_issues_completed: i32,
    #[sea_orm(default_value = 0)]
    pub sub_issues_percent_completed: i32,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
    #[sea_orm(has_one = "super::pull_request::Entity")]
    PullRequest,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
