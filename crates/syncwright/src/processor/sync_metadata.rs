//! Per-tenant timestamps gating reconciliation cooldowns.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::sync_metadata::{ActiveModel, Column, Entity as SyncMetadata, Model};
use crate::entity::sync_type::SyncType;
use crate::error::Result;
use crate::tenant::TenantId;

pub async fn last_synced_at<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    sync_type: SyncType,
) -> Result<Option<DateTime<Utc>>> {
    Ok(SyncMetadata::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::SyncType.eq(sync_type))
        .one(conn)
        .await?
        .map(|m| m.last_synced_at.with_timezone(&Utc)))
}

/// Record a successful pass. Only called once a pass has fully completed.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    sync_type: SyncType,
    at: DateTime<Utc>,
) -> Result<()> {
    let model = ActiveModel {
        tenant_id: Set(tenant_id),
        sync_type: Set(sync_type),
        last_synced_at: Set(at.fixed_offset()),
        ..Default::default()
    };
    SyncMetadata::insert(model)
        .on_conflict(
            OnConflict::columns([Column::TenantId, Column::SyncType])
                .update_column(Column::LastSyncedAt)
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Forget every pass timestamp of a tenant, making all passes eligible.
pub async fn clear_tenant<C: ConnectionTrait>(conn: &C, tenant_id: TenantId) -> Result<u64> {
    let res = SyncMetadata::delete_many()
        .filter(Column::TenantId.eq(tenant_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

pub async fn list<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>> {
    Ok(SyncMetadata::find()
        .order_by_asc(Column::TenantId)
        .order_by_asc(Column::SyncType)
        .all(conn)
        .await?)
}
