use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};

use crate::entity::user::{ActiveModel, Entity as User, Model};
use crate::error::Result;
use crate::payload::UserPayload;

use super::{merge, now};

/// Insert the user on first sight, otherwise merge the payload into the stored row.
pub async fn find_or_create<C: ConnectionTrait>(conn: &C, payload: &UserPayload) -> Result<Model> {
    let Some(current) = User::find_by_id(payload.id).one(conn).await? else {
        let model = ActiveModel {
            id: Set(payload.id),
            login: Set(payload.login.clone()),
            name: Set(payload.name.clone()),
            email: Set(payload.email.clone()),
            avatar_url: Set(payload.avatar_url.clone()),
            html_url: Set(payload.html_url.clone()),
            user_type: Set(payload.user_type.clone()),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.login = Set(payload.login.clone());
    active.name = Set(merge(current.name, payload.name.clone()));
    active.email = Set(merge(current.email, payload.email.clone()));
    active.avatar_url = Set(merge(current.avatar_url, payload.avatar_url.clone()));
    active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
    active.user_type = Set(merge(current.user_type, payload.user_type.clone()));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Upsert an optional user reference, returning its id.
pub async fn upsert_ref<C: ConnectionTrait>(
    conn: &C,
    payload: Option<&UserPayload>,
) -> Result<Option<i64>> {
    match payload {
        Some(user) => Ok(Some(find_or_create(conn, user).await?.id)),
        None => Ok(None),
    }
}
