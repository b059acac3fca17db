//! Review threads on open pull requests.
//!
//! Threads and comments missing locally are backfilled through the comment
//! processor; existing threads get their resolution state aligned and node
//! id recorded. Threads upstream no longer has are pruned.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ConnectionTrait, EntityTrait, TransactionTrait};

use crate::entity::state::ThreadState;
use crate::entity::sync_type::SyncType;
use crate::entity::{pull_request, pull_request_review_thread, repository};
use crate::error::{Result, SyncError};
use crate::graphql::queries;
use crate::graphql::query_as;
use crate::graphql::types::{
    PullRequestThreadsNode, PullRequestsField, RepositoryData, ReviewThreadNode,
};
use crate::processor::{review, review_comment, review_thread, user};
use crate::tenant::Tenant;

use super::Reconciler;
use super::paginate::Paginator;
use super::types::{ProgressCallback, ReconcileProgress, ReconcileStats, emit};

pub(super) async fn reconcile(
    ctx: &Reconciler,
    tenant: &Tenant,
    on_progress: Option<&ProgressCallback>,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    for repo in ctx.local_repositories(tenant).await? {
        stats.absorb(&reconcile_repository(ctx, tenant, &repo, on_progress).await?);
    }
    Ok(stats)
}

async fn reconcile_repository(
    ctx: &Reconciler,
    tenant: &Tenant,
    repo: &repository::Model,
    on_progress: Option<&ProgressCallback>,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    let mut pages = Paginator::new(ctx.settings.max_pages);
    loop {
        let query = queries::review_threads(
            &repo.owner_login,
            &repo.name,
            ctx.settings.page_size,
            pages.cursor(),
            ctx.settings.inner_page_size,
        );
        let data: RepositoryData<PullRequestsField> =
            query_as(ctx.client.as_ref(), tenant, &query).await?;
        let Some(connection) = data.repository.and_then(|r| r.connection.pull_requests) else {
            tracing::debug!(
                tenant = tenant.id,
                repository = %repo.full_name,
                "repository not visible upstream"
            );
            break;
        };

        emit(
            on_progress,
            ReconcileProgress::FetchedPage {
                tenant: tenant.id,
                kind: SyncType::ReviewThreads,
                scope: repo.full_name.clone(),
                page: pages.pages() + 1,
                count: connection.nodes.len(),
            },
        );
        for node in &connection.nodes {
            sync_pull_request(ctx, node, &mut stats).await?;
        }

        if !pages.advance(&connection.page_info) {
            break;
        }
    }

    stats.pages = pages.pages();
    if pages.is_truncated() {
        stats.truncated = true;
        emit(
            on_progress,
            ReconcileProgress::Truncated {
                tenant: tenant.id,
                kind: SyncType::ReviewThreads,
                scope: repo.full_name.clone(),
                pages: pages.pages(),
            },
        );
    }
    Ok(stats)
}

async fn sync_pull_request(
    ctx: &Reconciler,
    node: &PullRequestThreadsNode,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let Some(pull_request_id) = node.database_id else {
        return Ok(());
    };
    let Some(threads) = &node.review_threads else {
        return Ok(());
    };

    if pull_request::Entity::find_by_id(pull_request_id)
        .one(&ctx.db)
        .await?
        .is_none()
    {
        tracing::debug!(pull_request_id, number = node.number, "pull request not synced yet");
        return Ok(());
    }

    let txn = ctx.db.begin().await?;
    let mut seen = HashSet::new();
    for thread in &threads.nodes {
        let Some(root_id) = thread.root_comment_id() else {
            continue;
        };
        seen.insert(root_id);
        backfill_comments(&txn, pull_request_id, thread).await?;
        if sync_thread(&txn, root_id, thread).await? {
            stats.upserted += 1;
        }
    }

    if threads.is_complete() {
        stats.pruned += review_thread::prune(&txn, pull_request_id, &seen).await?;
    }
    txn.commit().await?;
    Ok(())
}

/// Upsert the thread's comments in upstream order, with the reviews they
/// belong to. The root comment creates the thread.
async fn backfill_comments<C: ConnectionTrait>(
    conn: &C,
    pull_request_id: i64,
    thread: &ReviewThreadNode,
) -> Result<()> {
    for node in thread.comment_nodes() {
        let Some(comment) = node.to_payload() else {
            continue;
        };
        let parent_review = node.pull_request_review.as_ref().and_then(|r| r.to_payload());
        if let Some(parent_review) = parent_review {
            review::upsert(conn, pull_request_id, &parent_review).await?;
        }
        match review_comment::upsert(conn, pull_request_id, &comment).await {
            Ok(_) => {}
            Err(SyncError::ParentNotFound { entity, id }) => {
                tracing::debug!(
                    comment_id = comment.id,
                    entity,
                    parent = %id,
                    "review comment parent not returned upstream"
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

async fn sync_thread<C: ConnectionTrait>(
    conn: &C,
    thread_id: i64,
    node: &ReviewThreadNode,
) -> Result<bool> {
    let Some(local) = pull_request_review_thread::Entity::find_by_id(thread_id)
        .one(conn)
        .await?
    else {
        tracing::debug!(thread_id, "thread root could not be stored");
        return Ok(false);
    };

    review_thread::set_node_id(conn, thread_id, &node.id).await?;
    match (node.is_resolved, local.state) {
        (true, ThreadState::Unresolved) => {
            let resolver = node.resolved_by.as_ref().and_then(|a| a.to_payload());
            let resolver_id = user::upsert_ref(conn, resolver.as_ref()).await?;
            review_thread::resolve(conn, thread_id, resolver_id, Utc::now()).await?;
        }
        (false, ThreadState::Resolved) => {
            review_thread::unresolve(conn, thread_id).await?;
        }
        _ => {}
    }
    Ok(true)
}
