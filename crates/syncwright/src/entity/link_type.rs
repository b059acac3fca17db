//! Kinds of directed issue-to-issue edges.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum IssueLinkType {
    /// `source` is the parent of `target`.
    #[sea_orm(string_value = "sub_issue")]
    SubIssue,
    /// `source` is blocked by `target`.
    #[sea_orm(string_value = "depends_on")]
    DependsOn,
    /// `source` blocks `target`.
    #[sea_orm(string_value = "blocks")]
    Blocks,
}

impl IssueLinkType {
    /// The edge type recorded in the opposite direction, if any.
    pub fn inverse(self) -> Option<Self> {
        match self {
            Self::SubIssue => None,
            Self::DependsOn => Some(Self::Blocks),
            Self::Blocks => Some(Self::DependsOn),
        }
    }
}
