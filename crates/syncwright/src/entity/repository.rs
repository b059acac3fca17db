//! Repository entity - owns issues, labels and milestones.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::visibility::RepositoryVisibility;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Provider numeric id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    // ─── Ownership ───────────────────────────────────────────────────────────
    /// Owning organization; `None` for user-owned repositories.
    pub organization_id: Option<i64>,
    pub owner_login: String,

    // ─── Naming ──────────────────────────────────────────────────────────────
    pub name: String,
    /// `owner/name`, as the provider reports it.
    pub full_name: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(default_value = "main")]
    pub default_branch: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    pub visibility: RepositoryVisibility,
    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::issue::Entity")]
    Issues,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
