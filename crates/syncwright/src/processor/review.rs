use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::entity::pull_request;
use crate::entity::pull_request_review::{ActiveModel, Column, Entity as Review, Model};
use crate::entity::state::ReviewState;
use crate::error::{Result, SyncError};
use crate::payload::ReviewPayload;

use super::{merge, now, require_parent, to_db_time, user};

/// Insert or merge a review. The pull request must already be synchronized.
///
/// Dismissal is terminal: once stored, a redelivered older state never
/// replaces it.
pub async fn upsert<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
    payload: &ReviewPayload,
) -> Result<Model> {
    let state = ReviewState::parse(&payload.state).ok_or_else(|| {
        SyncError::invalid_data(format!("unknown review state {:?}", payload.state))
    })?;
    require_parent::<pull_request::Entity, _>(conn, pull_request_id, "pull request").await?;
    let author_id = user::upsert_ref(conn, payload.user.as_ref()).await?;

    let Some(current) = Review::find_by_id(payload.id).one(conn).await? else {
        let model = ActiveModel {
            id: Set(payload.id),
            pull_request_id: Set(pull_request_id),
            author_id: Set(author_id),
            state: Set(state),
            body: Set(payload.body.clone()),
            submitted_at: Set(to_db_time(payload.submitted_at)),
            commit_id: Set(payload.commit_id.clone()),
            html_url: Set(payload.html_url.clone()),
            is_dismissed: Set(state == ReviewState::Dismissed),
            synced_at: Set(now()),
        };
        return Ok(model.insert(conn).await?);
    };

    let dismissed = current.is_dismissed || state == ReviewState::Dismissed;
    let mut active = current.clone().into_active_model();
    active.author_id = Set(merge(current.author_id, author_id));
    active.state = Set(if dismissed { ReviewState::Dismissed } else { state });
    active.body = Set(merge(current.body, payload.body.clone()));
    active.submitted_at = Set(merge(current.submitted_at, to_db_time(payload.submitted_at)));
    active.commit_id = Set(merge(current.commit_id, payload.commit_id.clone()));
    active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
    active.is_dismissed = Set(dismissed);
    active.synced_at = Set(now());
    Ok(active.update(conn).await?)
}

/// Mark a review dismissed. Returns `false` if the review is not synced yet.
pub async fn dismiss<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let Some(current) = Review::find_by_id(id).one(conn).await? else {
        tracing::debug!(review_id = id, "dismissal for unsynced review skipped");
        return Ok(false);
    };
    let mut active = current.into_active_model();
    active.state = Set(ReviewState::Dismissed);
    active.is_dismissed = Set(true);
    active.synced_at = Set(now());
    active.update(conn).await?;
    Ok(true)
}

pub async fn list_for_pull_request<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
) -> Result<Vec<Model>> {
    Ok(Review::find()
        .filter(Column::PullRequestId.eq(pull_request_id))
        .all(conn)
        .await?)
}
