//! Inline review comments and the threads they form.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::entity::pull_request_review_comment::{ActiveModel, Column, Entity as Comment, Model};
use crate::entity::pull_request_review_thread;
use crate::entity::{pull_request, pull_request_review};
use crate::error::{Result, SyncError};
use crate::payload::ReviewCommentPayload;

use super::{merge, now, require_parent, review_thread, to_db_time, user};

/// Insert or merge a review comment.
///
/// A root comment opens its own thread; a reply joins its parent's thread and
/// fails with [`SyncError::ParentNotFound`] until that parent is synchronized.
pub async fn upsert<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
    payload: &ReviewCommentPayload,
) -> Result<Model> {
    require_parent::<pull_request::Entity, _>(conn, pull_request_id, "pull request").await?;
    if let Some(review_id) = payload.pull_request_review_id {
        require_parent::<pull_request_review::Entity, _>(conn, review_id, "pull request review")
            .await?;
    }
    let author_id = user::upsert_ref(conn, payload.user.as_ref()).await?;

    if let Some(current) = Comment::find_by_id(payload.id).one(conn).await? {
        let mut active = current.clone().into_active_model();
        active.body = Set(payload.body.clone());
        active.author_id = Set(merge(current.author_id, author_id));
        active.review_id = Set(merge(current.review_id, payload.pull_request_review_id));
        active.line = Set(merge(current.line, payload.line));
        active.original_line = Set(merge(current.original_line, payload.original_line));
        active.start_line = Set(merge(current.start_line, payload.start_line));
        active.side = Set(merge(current.side, payload.side.clone()));
        active.commit_id = Set(merge(current.commit_id, payload.commit_id.clone()));
        active.diff_hunk = Set(merge(current.diff_hunk, payload.diff_hunk.clone()));
        active.html_url = Set(merge(current.html_url, payload.html_url.clone()));
        active.updated_at = Set(merge(current.updated_at, to_db_time(payload.updated_at)));
        active.synced_at = Set(now());
        return Ok(active.update(conn).await?);
    }

    let thread_id = match payload.in_reply_to_id {
        Some(parent_id) => {
            let parent = Comment::find_by_id(parent_id).one(conn).await?.ok_or(
                SyncError::ParentNotFound {
                    entity: "review comment",
                    id: parent_id.to_string(),
                },
            )?;
            parent.thread_id
        }
        None => {
            review_thread::find_or_create_for_root(conn, pull_request_id, payload)
                .await?
                .id
        }
    };

    let model = ActiveModel {
        id: Set(payload.id),
        pull_request_id: Set(pull_request_id),
        review_id: Set(payload.pull_request_review_id),
        thread_id: Set(thread_id),
        in_reply_to_id: Set(payload.in_reply_to_id),
        author_id: Set(author_id),
        body: Set(payload.body.clone()),
        html_url: Set(payload.html_url.clone()),
        path: Set(payload.path.clone()),
        line: Set(payload.line),
        original_line: Set(payload.original_line),
        start_line: Set(payload.start_line),
        side: Set(payload.side.clone()),
        commit_id: Set(payload.commit_id.clone()),
        diff_hunk: Set(payload.diff_hunk.clone()),
        created_at: Set(to_db_time(payload.created_at)),
        updated_at: Set(to_db_time(payload.updated_at)),
        synced_at: Set(now()),
    };
    Ok(model.insert(conn).await?)
}

/// Delete a comment, keeping its thread consistent.
///
/// Deleting a root comment moves the thread onto the oldest remaining
/// comment, or removes the thread when nothing is left.
pub async fn delete<C: ConnectionTrait>(conn: &C, id: i64) -> Result<bool> {
    let Some(comment) = Comment::find_by_id(id).one(conn).await? else {
        tracing::debug!(comment_id = id, "delete for unsynced review comment skipped");
        return Ok(false);
    };
    Comment::delete_by_id(id).exec(conn).await?;

    if comment.thread_id != comment.id {
        return Ok(true);
    }

    let Some(thread) = pull_request_review_thread::Entity::find_by_id(comment.thread_id)
        .one(conn)
        .await?
    else {
        return Ok(true);
    };

    let oldest = Comment::find()
        .filter(Column::ThreadId.eq(thread.id))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .one(conn)
        .await?;

    match oldest {
        Some(new_root) => {
            review_thread::re_anchor(conn, thread, new_root.id).await?;
        }
        None => {
            pull_request_review_thread::Entity::delete_by_id(thread.id)
                .exec(conn)
                .await?;
        }
    }
    Ok(true)
}

pub async fn list_for_thread<C: ConnectionTrait>(conn: &C, thread_id: i64) -> Result<Vec<Model>> {
    Ok(Comment::find()
        .filter(Column::ThreadId.eq(thread_id))
        .order_by_asc(Column::Id)
        .all(conn)
        .await?)
}
