//! Reconciliation outcomes and progress events.

use chrono::{DateTime, Utc};

use crate::entity::sync_type::SyncType;
use crate::tenant::TenantId;

/// Counters for one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Pages fetched from the top-level connection.
    pub pages: u32,
    /// Nodes written through the processors.
    pub upserted: usize,
    /// Local rows deleted because upstream no longer has them.
    pub pruned: u64,
    /// The page ceiling stopped the pass before the last page.
    pub truncated: bool,
    pub links_added: usize,
    pub links_removed: usize,
}

impl ReconcileStats {
    pub(crate) fn absorb(&mut self, other: &ReconcileStats) {
        self.pages += other.pages;
        self.upserted += other.upserted;
        self.pruned += other.pruned;
        self.truncated |= other.truncated;
        self.links_added += other.links_added;
        self.links_removed += other.links_removed;
    }
}

/// Result of asking for a pass.
///
/// `Skipped` is distinct from a completed pass that found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Skipped {
        last_synced_at: DateTime<Utc>,
        next_eligible_at: DateTime<Utc>,
    },
    Completed(ReconcileStats),
}

impl ReconcileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn stats(&self) -> Option<&ReconcileStats> {
        match self {
            Self::Completed(stats) => Some(stats),
            Self::Skipped { .. } => None,
        }
    }
}

/// Progress events emitted during reconciliation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ReconcileProgress {
    /// A pass is starting.
    Started { tenant: TenantId, kind: SyncType },

    /// The cooldown has not elapsed.
    Skipped {
        tenant: TenantId,
        kind: SyncType,
        next_eligible_at: DateTime<Utc>,
    },

    /// Fetched a page of the top-level connection.
    FetchedPage {
        tenant: TenantId,
        kind: SyncType,
        /// Scope the page belongs to (organization or repository).
        scope: String,
        /// Page number (1-indexed).
        page: u32,
        count: usize,
    },

    /// The page ceiling was reached; pruning is skipped for this scope.
    Truncated {
        tenant: TenantId,
        kind: SyncType,
        scope: String,
        pages: u32,
    },

    /// Waiting before retrying a failed query.
    Backoff {
        query: String,
        retry_after_ms: u64,
        attempt: u32,
    },

    Completed {
        tenant: TenantId,
        kind: SyncType,
        stats: ReconcileStats,
    },

    Failed {
        tenant: TenantId,
        kind: SyncType,
        error: String,
    },
}

/// Callback for reconciliation progress.
pub type ProgressCallback = Box<dyn Fn(ReconcileProgress) + Send + Sync>;

/// Emit a progress event if a callback is present.
#[inline]
pub fn emit(callback: Option<&ProgressCallback>, event: ReconcileProgress) {
    if let Some(cb) = callback {
        cb(event);
    }
}
