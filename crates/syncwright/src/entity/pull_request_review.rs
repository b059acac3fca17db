use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::state::ReviewState;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_request_reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Issue id of the reviewed pull request.
    pub pull_request_id: i64,
    pub author_id: Option<i64>,
    pub state: ReviewState,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub commit_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    #[sea_orm(default_value = false)]
    pub is_dismissed: bool,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
