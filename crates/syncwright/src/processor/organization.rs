use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};

use crate::entity::organization::{ActiveModel, Entity as Organization, Model};
use crate::error::Result;
use crate::payload::{OrganizationPayload, UserPayload};

use super::{merge, now};

pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    payload: &OrganizationPayload,
) -> Result<Model> {
    let Some(current) = Organization::find_by_id(payload.id).one(conn).await? else {
        let model = ActiveModel {
            id: Set(payload.id),
            login: Set(payload.login.clone()),
            name: Set(payload.name.clone()),
            avatar_url: Set(payload.avatar_url.clone()),
            html_url: Set(payload.html_url.clone()),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.login = Set(payload.login.clone());
    active.name = Set(merge(current.name, payload.name.clone()));
    active.avatar_url = Set(merge(current.avatar_url, payload.avatar_url.clone()));
    active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Treat an organization-typed repository owner as an organization reference.
pub fn from_owner(owner: &UserPayload) -> OrganizationPayload {
    OrganizationPayload {
        id: owner.id,
        login: owner.login.clone(),
        name: owner.name.clone(),
        avatar_url: owner.avatar_url.clone(),
        html_url: owner.html_url.clone(),
    }
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Organization::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}
