use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::label::{ActiveModel, Column, Entity as Label, Model};
use crate::entity::repository;
use crate::error::Result;
use crate::payload::LabelPayload;

use super::{merge, now, require_parent};

pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
    payload: &LabelPayload,
) -> Result<Model> {
    let Some(current) = Label::find_by_id(payload.id).one(conn).await? else {
        require_parent::<repository::Entity, _>(conn, repository_id, "repository").await?;
        let model = ActiveModel {
            id: Set(payload.id),
            repository_id: Set(repository_id),
            name: Set(payload.name.clone()),
            color: Set(payload.color.clone()),
            description: Set(payload.description.clone()),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.name = Set(payload.name.clone());
    active.color = Set(merge(current.color, payload.color.clone()));
    active.description = Set(merge(current.description, payload.description.clone()));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Label::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_for_repository<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
) -> Result<Vec<Model>> {
    Ok(Label::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .all(conn)
        .await?)
}

/// Refresh color and description of the label with this name.
///
/// Returns `false` when no local label carries the name.
pub async fn update_by_name<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
    name: &str,
    color: Option<String>,
    description: Option<String>,
) -> Result<bool> {
    let Some(current) = Label::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .filter(Column::Name.eq(name))
        .one(conn)
        .await?
    else {
        tracing::debug!(repository_id, name, "label not synced yet");
        return Ok(false);
    };

    let mut active = current.clone().into_active_model();
    active.color = Set(merge(current.color, color));
    active.description = Set(merge(current.description, description));
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

/// Delete labels of a repository whose names are not in `keep`.
pub async fn prune_by_name<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
    keep: &HashSet<String>,
) -> Result<u64> {
    let stale: Vec<i64> = list_for_repository(conn, repository_id)
        .await?
        .into_iter()
        .filter(|label| !keep.contains(&label.name))
        .map(|label| label.id)
        .collect();
    if stale.is_empty() {
        return Ok(0);
    }
    let res = Label::delete_many()
        .filter(Column::Id.is_in(stale))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}
