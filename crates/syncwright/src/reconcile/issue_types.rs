//! Organization issue types, keyed by node id.

use std::collections::HashSet;

use crate::entity::sync_type::SyncType;
use crate::error::{Result, SyncError};
use crate::graphql::queries;
use crate::graphql::query_as;
use crate::graphql::types::IssueTypesData;
use crate::payload::{IssueTypePayload, OrganizationPayload};
use crate::processor::{issue_type, organization};
use crate::tenant::Tenant;

use super::paginate::Paginator;
use super::types::{ProgressCallback, ReconcileProgress, ReconcileStats, emit};
use super::Reconciler;

pub(super) async fn reconcile(
    ctx: &Reconciler,
    tenant: &Tenant,
    on_progress: Option<&ProgressCallback>,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    let mut pages = Paginator::new(ctx.settings.max_pages);
    let mut seen = HashSet::new();
    let mut organization_id = None;

    loop {
        let query =
            queries::issue_types(&tenant.organization, ctx.settings.page_size, pages.cursor());
        let data: IssueTypesData = query_as(ctx.client.as_ref(), tenant, &query).await?;
        let org = data.organization.ok_or_else(|| {
            SyncError::invalid_data(format!("organization {} is not visible", tenant.organization))
        })?;
        let org_id = org.database_id.ok_or_else(|| {
            SyncError::invalid_data(format!("organization {} has no database id", org.login))
        })?;
        if organization_id.is_none() {
            organization::find_or_create(
                &ctx.db,
                &OrganizationPayload {
                    id: org_id,
                    login: org.login.clone(),
                    name: org.name.clone(),
                    avatar_url: None,
                    html_url: None,
                },
            )
            .await?;
            organization_id = Some(org_id);
        }

        let connection = org.connection.issue_types.unwrap_or_default();
        emit(
            on_progress,
            ReconcileProgress::FetchedPage {
                tenant: tenant.id,
                kind: SyncType::IssueTypes,
                scope: tenant.organization.clone(),
                page: pages.pages() + 1,
                count: connection.nodes.len(),
            },
        );
        for node in &connection.nodes {
            issue_type::find_or_create(&ctx.db, org_id, &IssueTypePayload::from(node)).await?;
            seen.insert(node.id.clone());
            stats.upserted += 1;
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
                kind: SyncType::IssueTypes,
                scope: tenant.organization.clone(),
                pages: pages.pages(),
            },
        );
    } else if let Some(org_id) = organization_id {
        stats.pruned = issue_type::prune(&ctx.db, org_id, &seen).await?;
    }
    Ok(stats)
}
