//! Reconciliation pass kinds tracked in `sync_metadata`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "kebab-case")]
pub enum SyncType {
    #[sea_orm(string_value = "issue_types")]
    IssueTypes,
    #[sea_orm(string_value = "labels")]
    Labels,
    #[sea_orm(string_value = "teams")]
    Teams,
    #[sea_orm(string_value = "issue_relations")]
    IssueRelations,
    #[sea_orm(string_value = "review_threads")]
    ReviewThreads,
}

impl SyncType {
    pub const ALL: [SyncType; 5] = [
        SyncType::IssueTypes,
        SyncType::Labels,
        SyncType::Teams,
        SyncType::IssueRelations,
        SyncType::ReviewThreads,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IssueTypes => "issue-types",
            Self::Labels => "labels",
            Self::Teams => "teams",
            Self::IssueRelations => "issue-relations",
            Self::ReviewThreads => "review-threads",
        }
    }
}

impl std::fmt::Display for SyncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.as_str().replace('-', "_") == s)
            .ok_or_else(|| format!("unknown sync type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_and_snake_case() {
        assert_eq!("review-threads".parse::<SyncType>(), Ok(SyncType::ReviewThreads));
        assert_eq!("issue_types".parse::<SyncType>(), Ok(SyncType::IssueTypes));
        assert!("stars".parse::<SyncType>().is_err());
    }
}
