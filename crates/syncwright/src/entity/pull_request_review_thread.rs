//! Review threads, keyed by the id of their root comment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::state::ThreadState;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_request_review_threads")]
pub struct Model {
    /// Id of the thread's root comment.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub pull_request_id: i64,
    pub state: ThreadState,
    pub resolved_by_id: Option<i64>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    pub path: Option<String>,
    pub line: Option<i32>,
    /// GraphQL node id, filled in by reconciliation.
    pub node_id: Option<String>,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request_review_comment::Entity")]
    Comments,
}

impl Related<super::pull_request_review_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
