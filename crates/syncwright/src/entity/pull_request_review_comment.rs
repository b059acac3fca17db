//! Inline review comments. Every comment belongs to exactly one thread.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_request_review_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub pull_request_id: i64,
    pub review_id: Option<i64>,
    pub thread_id: i64,
    pub in_reply_to_id: Option<i64>,
    pub author_id: Option<i64>,

    // ─── Content ─────────────────────────────────────────────────────────────
    #[sea_orm(column_type = "Text")]
    pub body: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,

    // ─── Diff Position ───────────────────────────────────────────────────────
    pub path: String,
    pub line: Option<i32>,
    pub original_line: Option<i32>,
    pub start_line: Option<i32>,
    /// `LEFT` or `RIGHT`.
    pub side: Option<String>,
    pub commit_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub diff_hunk: Option<String>,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request_review_thread::Entity",
        from = "Column::ThreadId",
        to = "super::pull_request_review_thread::Column::Id"
    )]
    Thread,
}

impl Related<super::pull_request_review_thread::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thread.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
