//! Directed issue relation edges with set-reconciling sync.

use std::collections::BTreeSet;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entity::issue;
use crate::entity::issue_link::{ActiveModel, Column, Entity as IssueLink};
use crate::entity::link_type::IssueLinkType;
use crate::error::Result;

use super::{now, require_parent};

/// Outcome of reconciling one issue's edges of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
    pub unchanged: usize,
}

impl LinkDiff {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

fn upsert_on_conflict() -> OnConflict {
    OnConflict::columns([Column::SourceIssueId, Column::TargetIssueId, Column::LinkType])
        .do_nothing()
        .to_owned()
}

async fn insert_edge<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    target: i64,
    link_type: IssueLinkType,
) -> Result<bool> {
    let model = ActiveModel {
        source_issue_id: Set(source),
        target_issue_id: Set(target),
        link_type: Set(link_type),
        created_at: Set(now()),
        ..Default::default()
    };
    let rows = IssueLink::insert(model)
        .on_conflict(upsert_on_conflict())
        .exec_without_returning(conn)
        .await?;
    Ok(rows > 0)
}

async fn delete_edge<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    target: i64,
    link_type: IssueLinkType,
) -> Result<bool> {
    let res = IssueLink::delete_many()
        .filter(Column::SourceIssueId.eq(source))
        .filter(Column::TargetIssueId.eq(target))
        .filter(Column::LinkType.eq(link_type))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Add an edge, and its inverse for dependency types.
///
/// Both issues must exist. Returns `true` if the forward edge was new.
pub async fn add<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    target: i64,
    link_type: IssueLinkType,
) -> Result<bool> {
    require_parent::<issue::Entity, _>(conn, source, "issue").await?;
    require_parent::<issue::Entity, _>(conn, target, "issue").await?;

    let inserted = insert_edge(conn, source, target, link_type).await?;
    if let Some(inverse) = link_type.inverse() {
        insert_edge(conn, target, source, inverse).await?;
    }
    Ok(inserted)
}

/// Remove an edge and its inverse. Returns `true` if the forward edge existed.
pub async fn remove<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    target: i64,
    link_type: IssueLinkType,
) -> Result<bool> {
    let removed = delete_edge(conn, source, target, link_type).await?;
    if let Some(inverse) = link_type.inverse() {
        delete_edge(conn, target, source, inverse).await?;
    }
    Ok(removed)
}

/// Targets of `source`'s edges of `link_type`.
pub async fn targets<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    link_type: IssueLinkType,
) -> Result<BTreeSet<i64>> {
    Ok(IssueLink::find()
        .filter(Column::SourceIssueId.eq(source))
        .filter(Column::LinkType.eq(link_type))
        .all(conn)
        .await?
        .into_iter()
        .map(|edge| edge.target_issue_id)
        .collect())
}

/// Make `source`'s edges of `link_type` equal `upstream`.
///
/// Upstream-only edges are inserted, local-only edges deleted, common edges
/// left untouched.
pub async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    source: i64,
    link_type: IssueLinkType,
    upstream: &BTreeSet<i64>,
) -> Result<LinkDiff> {
    let local = targets(conn, source, link_type).await?;

    let mut diff = LinkDiff {
        unchanged: local.intersection(upstream).count(),
        ..LinkDiff::default()
    };
    for &target in upstream.difference(&local) {
        add(conn, source, target, link_type).await?;
        diff.added.push(target);
    }
    for &target in local.difference(upstream) {
        remove(conn, source, target, link_type).await?;
        diff.removed.push(target);
    }
    Ok(diff)
}
