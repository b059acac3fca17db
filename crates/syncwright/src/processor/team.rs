use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::organization;
use crate::entity::team::{ActiveModel, Column, Entity as Team, Model};
use crate::entity::team_membership;
use crate::entity::team_role::TeamRole;
use crate::error::Result;
use crate::payload::{TeamPayload, UserPayload};

use super::{merge, now, require_parent, user};

pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
    payload: &TeamPayload,
) -> Result<Model> {
    let parent_team_id = payload.parent.as_ref().map(|p| p.id);

    let Some(current) = Team::find_by_id(payload.id).one(conn).await? else {
        require_parent::<organization::Entity, _>(conn, organization_id, "organization").await?;
        let model = ActiveModel {
            id: Set(payload.id),
            organization_id: Set(organization_id),
            name: Set(payload.name.clone()),
            slug: Set(payload.slug.clone()),
            description: Set(payload.description.clone()),
            privacy: Set(payload.privacy.clone()),
            parent_team_id: Set(parent_team_id),
            html_url: Set(payload.html_url.clone()),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.name = Set(payload.name.clone());
    active.slug = Set(payload.slug.clone());
    active.description = Set(merge(current.description, payload.description.clone()));
    active.privacy = Set(merge(current.privacy, payload.privacy.clone()));
    active.parent_team_id = Set(merge(current.parent_team_id, parent_team_id));
    active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Team::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}

/// Delete the organization's teams that are not in `seen`.
pub async fn prune<C: ConnectionTrait>(
    conn: &C,
    organization_id: i64,
    seen: &HashSet<i64>,
) -> Result<u64> {
    let res = Team::delete_many()
        .filter(Column::OrganizationId.eq(organization_id))
        .filter(Column::Id.is_not_in(seen.iter().copied()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

/// Add or update a membership. The team must exist.
pub async fn add_member<C: ConnectionTrait>(
    conn: &C,
    team_id: i64,
    member: &UserPayload,
    role: TeamRole,
) -> Result<team_membership::Model> {
    require_parent::<crate::entity::team::Entity, _>(conn, team_id, "team").await?;
    let member = user::find_or_create(conn, member).await?;

    match team_membership::Entity::find_by_id((team_id, member.id))
        .one(conn)
        .await?
    {
        Some(current) if current.role == role => Ok(current),
        Some(current) => {
            let mut active = current.into_active_model();
            active.role = Set(role);
            Ok(active.update(conn).await?)
        }
        None => Ok(team_membership::ActiveModel {
            team_id: Set(team_id),
            user_id: Set(member.id),
            role: Set(role),
        }
        .insert(conn)
        .await?),
    }
}

/// Record a membership without touching the role of an existing one.
pub async fn ensure_member<C: ConnectionTrait>(
    conn: &C,
    team_id: i64,
    member: &UserPayload,
    role: TeamRole,
) -> Result<team_membership::Model> {
    if let Some(current) = team_membership::Entity::find_by_id((team_id, member.id))
        .one(conn)
        .await?
    {
        user::find_or_create(conn, member).await?;
        return Ok(current);
    }
    add_member(conn, team_id, member, role).await
}

pub async fn remove_member<C: ConnectionTrait>(
    conn: &C,
    team_id: i64,
    user_id: i64,
) -> Result<bool> {
    let res = team_membership::Entity::delete_by_id((team_id, user_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Make a team's memberships equal `upstream`. Returns `(added_or_updated, removed)`.
pub async fn reconcile_members<C: ConnectionTrait>(
    conn: &C,
    team_id: i64,
    upstream: &[(UserPayload, TeamRole)],
) -> Result<(usize, u64)> {
    let local: HashMap<i64, TeamRole> = team_membership::Entity::find()
        .filter(team_membership::Column::TeamId.eq(team_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.user_id, m.role))
        .collect();

    let mut changed = 0;
    let mut keep = HashSet::with_capacity(upstream.len());
    for (member, role) in upstream {
        keep.insert(member.id);
        if local.get(&member.id) != Some(role) {
            changed += 1;
        }
        add_member(conn, team_id, member, *role).await?;
    }

    let res = team_membership::Entity::delete_many()
        .filter(team_membership::Column::TeamId.eq(team_id))
        .filter(team_membership::Column::UserId.is_not_in(keep))
        .exec(conn)
        .await?;
    Ok((changed, res.rows_affected))
}
