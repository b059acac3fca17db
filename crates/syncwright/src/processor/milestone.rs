use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};

use crate::entity::milestone::{ActiveModel, Entity as Milestone, Model};
use crate::entity::repository;
use crate::entity::state::MilestoneState;
use crate::error::Result;
use crate::payload::MilestonePayload;

use super::{merge, now, require_parent, to_db_time};

pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    repository_id: i64,
    payload: &MilestonePayload,
) -> Result<Model> {
    let state = payload.state.as_deref().map(MilestoneState::parse);

    let Some(current) = Milestone::find_by_id(payload.id).one(conn).await? else {
        require_parent::<repository::Entity, _>(conn, repository_id, "repository").await?;
        let model = ActiveModel {
            id: Set(payload.id),
            repository_id: Set(repository_id),
            number: Set(payload.number),
            title: Set(payload.title.clone()),
            description: Set(payload.description.clone()),
            state: Set(state.unwrap_or(MilestoneState::Open)),
            due_on: Set(to_db_time(payload.due_on)),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let mut active = current.clone().into_active_model();
    active.title = Set(payload.title.clone());
    active.description = Set(merge(current.description, payload.description.clone()));
    if let Some(state) = state {
        active.state = Set(state);
    }
    active.due_on = Set(merge(current.due_on, to_db_time(payload.due_on)));
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let res = Milestone::delete_by_id(id).exec(conn).await?;
    Ok(res.rows_affected > 0)
}
