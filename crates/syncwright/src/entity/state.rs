//! Lifecycle states stored as strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Open/closed state shared by issues and pull requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum IssueState {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl IssueState {
    /// Parse the provider's state string (`open`, `OPEN`, `closed`, `MERGED`).
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("open") {
            Self::Open
        } else {
            Self::Closed
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum MilestoneState {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl MilestoneState {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("closed") {
            Self::Closed
        } else {
            Self::Open
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ReviewState {
    #[sea_orm(string_value = "commented")]
    Commented,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "changes_requested")]
    ChangesRequested,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
    #[sea_orm(string_value = "pending")]
    Pending,
}

impl ReviewState {
    /// Parse both webhook (`approved`) and GraphQL (`APPROVED`) spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "commented" => Some(Self::Commented),
            "approved" => Some(Self::Approved),
            "changes_requested" => Some(Self::ChangesRequested),
            "dismissed" => Some(Self::Dismissed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Resolution state of a review thread.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ThreadState {
    #[sea_orm(string_value = "unresolved")]
    #[default]
    Unresolved,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}
