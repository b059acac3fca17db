use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::issue_type::{ActiveModel, Column, Entity as IssueType, Model};
use crate::entity::organization;
use crate::error::Result;
use crate::payload::IssueTypePayload;

use super::{merge, now, require_parent};

pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
    payload: &IssueTypePayload,
) -> Result<Model> {
    let Some(current) = IssueType::find_by_id(payload.node_id.clone()).one(conn).await? else {
        require_parent::<organization::Entity, _>(conn, organization_id, "organization").await?;
        let model = ActiveModel {
            id: Set(payload.node_id.clone()),
            organization_id: Set(organization_id),
            name: Set(payload.name.clone()),
            description: Set(payload.description.clone()),
            color: Set(payload.color.clone()),
            is_enabled: Set(payload.is_enabled.unwrap_or(true)),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.name = Set(payload.name.clone());
    active.description = Set(merge(current.description, payload.description.clone()));
    active.color = Set(merge(current.color, payload.color.clone()));
    if let Some(enabled) = payload.is_enabled {
        active.is_enabled = Set(enabled);
    }
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Delete the organization's issue types that are not in `seen`.
pub async fn prune<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
    seen: &HashSet<String>,
) -> Result<u64> {
    let res = IssueType::delete_many()
        .filter(Column::OrganizationId.eq(organization_id))
        .filter(Column::Id.is_not_in(seen.iter().cloned()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

pub async fn list_for_organization<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
) -> Result<Vec<Model>> {
    Ok(IssueType::find()
        .filter(Column::OrganizationId.eq(organization_id))
        .all(conn)
        .await?)
}
