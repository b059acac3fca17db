use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What produced a contribution event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ContributionSource {
    #[sea_orm(string_value = "PULL_REQUEST_REVIEW")]
    PullRequestReview,
}
