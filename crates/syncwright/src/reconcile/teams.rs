//! Organization teams and their direct memberships.

use std::collections::HashSet;

use sea_orm::TransactionTrait;

use crate::entity::sync_type::SyncType;
use crate::entity::team_role::TeamRole;
use crate::error::{Result, SyncError};
use crate::graphql::queries;
use crate::graphql::query_as;
use crate::graphql::types::{TeamNode, TeamsData};
use crate::payload::OrganizationPayload;
use crate::processor::{organization, team};
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
        let query = queries::teams(
            &tenant.organization,
            ctx.settings.page_size,
            pages.cursor(),
            ctx.settings.inner_page_size,
        );
        let data: TeamsData = query_as(ctx.client.as_ref(), tenant, &query).await?;
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

        let connection = org.connection.teams.unwrap_or_default();
        emit(
            on_progress,
            ReconcileProgress::FetchedPage {
                tenant: tenant.id,
                kind: SyncType::Teams,
                scope: tenant.organization.clone(),
                page: pages.pages() + 1,
                count: connection.nodes.len(),
            },
        );
        for node in &connection.nodes {
            if let Some(team_id) = upsert_team(ctx, org_id, node, &mut stats).await? {
                seen.insert(team_id);
            }
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
                kind: SyncType::Teams,
                scope: tenant.organization.clone(),
                pages: pages.pages(),
            },
        );
    } else if let Some(org_id) = organization_id {
        stats.pruned += team::prune(&ctx.db, org_id, &seen).await?;
    }
    Ok(stats)
}

/// Upsert one team and its members in a single transaction.
///
/// Members are only pruned when the member list came back complete.
async fn upsert_team(
    ctx: &Reconciler,
    organization_id: i64,
    node: &TeamNode,
    stats: &mut ReconcileStats,
) -> Result<Option<i64>> {
    let Some(payload) = node.to_payload() else {
        tracing::debug!(slug = %node.slug, "team without database id skipped");
        return Ok(None);
    };

    let txn = ctx.db.begin().await?;
    team::find_or_create(&txn, organization_id, &payload).await?;
    stats.upserted += 1;

    if let Some(members) = &node.members {
        let upstream: Vec<_> = members
            .edges
            .iter()
            .filter_map(|edge| Some((edge.node.to_payload()?, TeamRole::parse(&edge.role))))
            .collect();
        if members.page_info.has_next_page {
            for (member, role) in &upstream {
                team::add_member(&txn, payload.id, member, *role).await?;
            }
        } else {
            let (_, removed) = team::reconcile_members(&txn, payload.id, &upstream).await?;
            stats.pruned += removed;
        }
    }
    txn.commit().await?;
    Ok(Some(payload.id))
}
