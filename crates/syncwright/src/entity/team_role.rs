use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TeamRole {
    #[sea_orm(string_value = "member")]
    #[default]
    Member,
    #[sea_orm(string_value = "maintainer")]
    Maintainer,
}

impl TeamRole {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("maintainer") {
            Self::Maintainer
        } else {
            Self::Member
        }
    }
}
