//! Repository labels, matched by `(repository, name)`.
//!
//! The graph API exposes no numeric label id, so unknown names are left to
//! the `label` webhook; known names are refreshed and local-only names pruned.

use std::collections::HashSet;

use crate::entity::repository;
use crate::entity::sync_type::SyncType;
use crate::error::Result;
use crate::graphql::queries;
use crate::graphql::query_as;
use crate::graphql::types::{LabelsField, RepositoryData};
use crate::processor::label;
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
    let mut seen = HashSet::new();

    loop {
        let query = queries::labels(
            &repo.owner_login,
            &repo.name,
            ctx.settings.page_size,
            pages.cursor(),
        );
        let data: RepositoryData<LabelsField> =
            query_as(ctx.client.as_ref(), tenant, &query).await?;
        let Some(connection) = data.repository.and_then(|r| r.connection.labels) else {
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
                kind: SyncType::Labels,
                scope: repo.full_name.clone(),
                page: pages.pages() + 1,
                count: connection.nodes.len(),
            },
        );
        for node in &connection.nodes {
            let color = node.color.as_ref().map(|c| c.to_lowercase());
            let description = node.description.clone();
            if label::update_by_name(&ctx.db, repo.id, &node.name, color, description).await? {
                stats.upserted += 1;
            }
            seen.insert(node.name.clone());
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
                kind: SyncType::Labels,
                scope: repo.full_name.clone(),
                pages: pages.pages(),
            },
        );
    } else if pages.pages() > 0 {
        stats.pruned += label::prune_by_name(&ctx.db, repo.id, &seen).await?;
    }
    Ok(stats)
}
