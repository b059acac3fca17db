use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::repository::{ActiveModel, Column, Entity as Repository, Model};
use crate::entity::visibility::RepositoryVisibility;
use crate::error::Result;
use crate::payload::RepositoryPayload;

use super::{merge, now, organization, user};

/// Insert or merge a repository, creating its owning organization or user first.
pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    payload: &RepositoryPayload,
) -> Result<Model> {
    let organization_id = if payload.is_organization_owned() {
        let owner = organization::from_owner(&payload.owner);
        let org = organization::find_or_create(conn, &owner).await?;
        Some(org.id)
    } else {
        user::find_or_create(conn, &payload.owner).await?;
        None
    };

    let visibility = (payload.visibility.is_some() || payload.private.is_some()).then(|| {
        RepositoryVisibility::from_payload(payload.visibility.as_deref(), payload.private)
    });

    let Some(current) = Repository::find_by_id(payload.id).one(conn).await? else {
        let model = ActiveModel {
            id: Set(payload.id),
            organization_id: Set(organization_id),
            owner_login: Set(payload.owner.login.clone()),
            name: Set(payload.name.clone()),
            full_name: Set(payload.full_name.clone()),
            description: Set(payload.description.clone()),
            default_branch: Set(payload
                .default_branch
                .clone()
                .unwrap_or_else(|| "main".to_string())),
            html_url: Set(payload.html_url.clone()),
            visibility: Set(visibility.unwrap_or_default()),
            is_archived: Set(payload.archived.unwrap_or(false)),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.organization_id = Set(merge(current.organization_id, organization_id));
    active.owner_login = Set(payload.owner.login.clone());
    active.name = Set(payload.name.clone());
    active.full_name = Set(payload.full_name.clone());
    active.description = Set(merge(current.description, payload.description.clone()));
    if let Some(branch) = &payload.default_branch {
        active.default_branch = Set(branch.clone());
    }
    active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
    if let Some(visibility) = visibility {
        active.visibility = Set(visibility);
    }
    if let Some(archived) = payload.archived {
        active.is_archived = Set(archived);
    }
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

pub async fn find_by_full_name<C: ConnectionTrait>(
    conn: &C,
    full_name: &str,
) -> Result<Option<Model>> {
    Ok(Repository::find()
        .filter(Column::FullName.eq(full_name))
        .one(conn)
        .await?)
}

/// Delete a repository and, through cascading keys, everything it owns.
pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Repository::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}
