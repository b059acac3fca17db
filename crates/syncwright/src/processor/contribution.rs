//! Contribution ledger, written after an event's transaction commits.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entity::contribution_event::{ActiveModel, Column, Entity as ContributionEvent, Model};
use crate::entity::contribution_source::ContributionSource;
use crate::error::Result;

use super::now;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub source: ContributionSource,
    pub source_id: i64,
    pub actor_id: i64,
    pub repository_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Upsert keyed by `(source_type, source_id)`; replays never duplicate.
pub async fn record<C: ConnectionTrait>(conn: &C, event: &ContributionRecord) -> Result<()> {
    let model = ActiveModel {
        source_type: Set(event.source),
        source_id: Set(event.source_id),
        actor_id: Set(event.actor_id),
        repository_id: Set(event.repository_id),
        occurred_at: Set(event.occurred_at.fixed_offset()),
        recorded_at: Set(now()),
        ..Default::default()
    };
    ContributionEvent::insert(model)
        .on_conflict(
            OnConflict::columns([Column::SourceType, Column::SourceId])
                .update_columns([Column::ActorId, Column::RepositoryId, Column::OccurredAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    tracing::debug!(
        source = ?event.source,
        source_id = event.source_id,
        actor_id = event.actor_id,
        "contribution recorded"
    );
    Ok(())
}

pub async fn find<C: ConnectionTrait>(
    conn: &C,
    source: ContributionSource,
    source_id: i64,
) -> Result<Option<Model>> {
    Ok(ContributionEvent::find()
        .filter(Column::SourceType.eq(source))
        .filter(Column::SourceId.eq(source_id))
        .one(conn)
        .await?)
}

pub async fn list_for_actor<C: ConnectionTrait>(conn: &C, actor_id: i64) -> Result<Vec<Model>> {
    Ok(ContributionEvent::find()
        .filter(Column::ActorId.eq(actor_id))
        .all(conn)
        .await?)
}
