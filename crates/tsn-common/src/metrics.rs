//! Offload statistics for the diagnostics interface.
//!
//! Counters come from two places: the reset path (owned by the adapter,
//! updated under its lock) and the apply dispatcher (atomics, updated
//! without touching the adapter). [`TsnStats`] merges both into one
//! serializable snapshot.

use crate::flags::TsnFlags;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of one reset, as seen by the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Registers were returned to link defaults.
    Disabled,
    /// The full TSN configuration was programmed and flags committed.
    Enabled,
    /// The enable path failed; flags were left untouched.
    Failed,
}

/// Counters maintained by the reset path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetCounters {
    /// Total resets run (synchronous or deferred).
    pub resets_total: u64,
    /// Resets that ended on the disable path.
    pub disables: u64,
    /// Resets that ended on the enable path with a flag commit.
    pub enables: u64,
    /// Resets whose enable path reported a failure.
    pub reset_failures: u64,
    /// Gate schedules updated too late to take effect at the requested base time.
    pub schedule_change_errors: u64,
}

impl ResetCounters {
    /// Record a completed reset.
    pub fn record(&mut self, kind: ResetKind) {
        self.resets_total += 1;
        match kind {
            ResetKind::Disabled => self.disables += 1,
            ResetKind::Enabled => self.enables += 1,
            ResetKind::Failed => self.reset_failures += 1,
        }
    }

    /// Record a missed schedule window.
    pub fn record_schedule_change_error(&mut self) {
        self.schedule_change_errors += 1;
    }
}

/// Counters maintained by the apply dispatcher.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    /// Resets handed to the deferred worker.
    deferred: AtomicU64,
    /// Dispatches absorbed by a reset that was already pending.
    coalesced: AtomicU64,
}

impl DispatchCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reset queued on the worker.
    pub fn record_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dispatch merged into a pending reset.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of resets queued on the worker.
    pub fn deferred(&self) -> u64 {
        self.deferred.load(Ordering::Relaxed)
    }

    /// Number of dispatches merged into a pending reset.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

/// Immutable snapshot of offload statistics for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TsnStats {
    /// Feature flags of the last successfully applied configuration.
    pub flags: TsnFlags,
    /// Total resets run.
    pub resets_total: u64,
    /// Resets that ended on the disable path.
    pub disables: u64,
    /// Resets that committed a TSN configuration.
    pub enables: u64,
    /// Resets whose enable path failed.
    pub reset_failures: u64,
    /// Missed schedule windows caused by late schedule updates.
    pub schedule_change_errors: u64,
    /// Resets queued on the deferred worker.
    pub deferred_resets: u64,
    /// Dispatches merged into an already pending deferred reset.
    pub coalesced_resets: u64,
}

impl TsnStats {
    /// Merge reset-path and dispatcher counters.
    #[must_use]
    pub fn new(flags: TsnFlags, resets: &ResetCounters, dispatch: &DispatchCounters) -> Self {
        Self {
            flags,
            resets_total: resets.resets_total,
            disables: resets.disables,
            enables: resets.enables,
            reset_failures: resets.reset_failures,
            schedule_change_errors: resets.schedule_change_errors,
            deferred_resets: dispatch.deferred(),
            coalesced_resets: dispatch.coalesced(),
        }
    }
}
