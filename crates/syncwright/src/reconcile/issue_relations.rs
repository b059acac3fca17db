//! Sub-issue and dependency edges of open issues, set-reconciled per issue.

use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};

use crate::entity::link_type::IssueLinkType;
use crate::entity::state::IssueState;
use crate::entity::sync_type::SyncType;
use crate::entity::{issue, repository};
use crate::error::Result;
use crate::graphql::queries;
use crate::graphql::query_as;
use crate::graphql::types::{
    Connection, IssueRelationNode, IssuesField, RelatedIssueNode, RepositoryData,
};
use crate::processor::issue::IssueRecord;
use crate::processor::{issue as issue_processor, issue_link, repository as repository_processor};
use crate::tenant::{ScopeFilter, Tenant};

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
        let query = queries::issue_relations(
            &repo.owner_login,
            &repo.name,
            ctx.settings.page_size,
            pages.cursor(),
            ctx.settings.inner_page_size,
        );
        let data: RepositoryData<IssuesField> =
            query_as(ctx.client.as_ref(), tenant, &query).await?;
        let Some(connection) = data.repository.and_then(|r| r.connection.issues) else {
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
                kind: SyncType::IssueRelations,
                scope: repo.full_name.clone(),
                page: pages.pages() + 1,
                count: connection.nodes.len(),
            },
        );
        for node in &connection.nodes {
            sync_issue(ctx, tenant, repo.id, node, &mut stats).await?;
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
                kind: SyncType::IssueRelations,
                scope: repo.full_name.clone(),
                pages: pages.pages(),
            },
        );
    }
    Ok(stats)
}

async fn sync_issue(
    ctx: &Reconciler,
    scope: &dyn ScopeFilter,
    repository_id: i64,
    node: &IssueRelationNode,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let Some(issue_id) = node.database_id else {
        return Ok(());
    };

    let state = IssueState::parse(&node.state);
    let mut record = IssueRecord::minimal(issue_id, node.number, node.title.clone(), state);
    record.sub_issues = node.sub_issues_summary.map(Into::into);

    let txn = ctx.db.begin().await?;
    issue_processor::upsert(&txn, repository_id, &record).await?;
    stats.upserted += 1;

    if let Some(children) = &node.sub_issues {
        sync_edges(&txn, scope, issue_id, IssueLinkType::SubIssue, children, stats).await?;
    }
    if let Some(blockers) = &node.blocked_by {
        sync_edges(&txn, scope, issue_id, IssueLinkType::DependsOn, blockers, stats).await?;
    }
    txn.commit().await?;
    Ok(())
}

/// Reconcile one edge type of one issue.
///
/// Unsynced targets in a monitored repository are created first; targets
/// outside every monitored repository are ignored. A truncated inner
/// connection only adds edges.
async fn sync_edges<C: ConnectionTrait>(
    conn: &C,
    scope: &dyn ScopeFilter,
    source: i64,
    link_type: IssueLinkType,
    upstream: &Connection<RelatedIssueNode>,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let ids: Vec<i64> = upstream.nodes.iter().filter_map(|n| n.database_id).collect();
    let mut targets = known_issue_ids(conn, &ids).await?;
    for node in &upstream.nodes {
        let Some(id) = node.database_id else {
            continue;
        };
        if !targets.contains(&id) && ensure_target(conn, scope, node).await? {
            stats.upserted += 1;
            targets.insert(id);
        }
    }

    if upstream.is_complete() {
        let diff = issue_link::reconcile(conn, source, link_type, &targets).await?;
        stats.links_added += diff.added.len();
        stats.links_removed += diff.removed.len();
    } else {
        for target in targets {
            if issue_link::add(conn, source, target, link_type).await? {
                stats.links_added += 1;
            }
        }
    }
    Ok(())
}

/// Create an unsynced edge target, and its repository if needed.
///
/// Returns `false` when the node lacks the fields to place it or its
/// repository is not monitored.
async fn ensure_target<C: ConnectionTrait>(
    conn: &C,
    scope: &dyn ScopeFilter,
    node: &RelatedIssueNode,
) -> Result<bool> {
    let (Some(id), Some(number), Some(title)) = (node.database_id, node.number, &node.title)
    else {
        tracing::debug!(issue_id = ?node.database_id, "relation target without issue fields");
        return Ok(false);
    };
    let Some(repo) = node.repository.as_ref().and_then(|r| r.to_payload()) else {
        tracing::debug!(issue_id = id, "relation target without repository");
        return Ok(false);
    };
    if !scope.is_repository_in_scope(&repo.full_name) {
        tracing::debug!(
            issue_id = id,
            repository = %repo.full_name,
            "relation target outside monitored scope"
        );
        return Ok(false);
    }

    let repository_id = match repository::Entity::find_by_id(repo.id).one(conn).await? {
        Some(existing) => existing.id,
        None => repository_processor::find_or_create(conn, &repo).await?.id,
    };
    let state = node.state.as_deref().map_or(IssueState::Open, IssueState::parse);
    let record = IssueRecord::minimal(id, number, title.clone(), state);
    issue_processor::upsert(conn, repository_id, &record).await?;
    Ok(true)
}

async fn known_issue_ids<C: ConnectionTrait>(conn: &C, ids: &[i64]) -> Result<BTreeSet<i64>> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let found: Vec<i64> = issue::Entity::find()
        .select_only()
        .column(issue::Column::Id)
        .filter(issue::Column::Id.is_in(ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(found.into_iter().collect())
}
