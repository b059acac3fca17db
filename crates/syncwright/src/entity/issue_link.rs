//! Directed issue relation edges (sub-issues and dependencies).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::link_type::IssueLinkType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issue_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_issue_id: i64,
    pub target_issue_id: i64,
    pub link_type: IssueLinkType,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
