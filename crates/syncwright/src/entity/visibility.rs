//! Repository visibility.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum RepositoryVisibility {
    #[sea_orm(string_value = "public")]
    #[default]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
    /// Enterprise-only: visible to members of the enterprise.
    #[sea_orm(string_value = "internal")]
    Internal,
}

impl RepositoryVisibility {
    /// Resolve the visibility from a webhook's `visibility` string, falling back to `private`.
    pub fn from_payload(visibility: Option<&str>, private: Option<bool>) -> Self {
        match visibility.map(str::to_ascii_lowercase).as_deref() {
            Some("public") => Self::Public,
            Some("private") => Self::Private,
            Some("internal") => Self::Internal,
            _ if private == Some(true) => Self::Private,
            _ => Self::Public,
        }
    }
}

impl std::fmt::Display for RepositoryVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_payload_prefers_explicit_visibility() {
        assert_eq!(
            RepositoryVisibility::from_payload(Some("INTERNAL"), Some(true)),
            RepositoryVisibility::Internal
        );
        assert_eq!(
            RepositoryVisibility::from_payload(None, Some(true)),
            RepositoryVisibility::Private
        );
        assert_eq!(
            RepositoryVisibility::from_payload(None, None),
            RepositoryVisibility::Public
        );
    }

    #[test]
    fn display_outputs_expected_strings() {
        assert_eq!(RepositoryVisibility::Public.to_string(), "public");
        assert_eq!(RepositoryVisibility::Internal.to_string(), "internal");
    }
}
