//! Organization-level issue type taxonomy (Bug, Feature, Task, ...).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issue_types")]
pub struct Model {
    /// Provider node id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub color: Option<String>,
    #[sea_orm(default_value = true)]
    pub is_enabled: bool,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
