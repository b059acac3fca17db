//! Append-only ledger of contributions, unique per source.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::contribution_source::ContributionSource;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contribution_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_type: ContributionSource,
    /// Provider id of the source entity (e.g. review id).
    pub source_id: i64,
    pub actor_id: i64,
    pub repository_id: Option<i64>,
    pub occurred_at: DateTimeWithTimeZone,
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
