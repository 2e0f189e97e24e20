//! Gate schedule synchronization to the live device clock.
//!
//! Hardware only starts a gate schedule at a base time that has not yet
//! passed. A base time in the past is moved forward by whole cycles to the
//! first cycle boundary strictly after the clock sample, which keeps the
//! schedule phase-aligned with what was requested.

use serde::Serialize;
use tracing::debug;
use tsn_common::{DeviceTime, TsnError, TsnResult, NSEC_PER_SEC};

/// Result of synchronizing a requested base time against the device clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BaseTimeSync {
    /// The requested base time had already passed and was advanced.
    Advanced {
        /// Synchronized base time in nanoseconds.
        base_time_ns: i64,
        /// Whole cycles skipped (`n + 1`).
        cycles_skipped: u64,
    },
    /// The requested base time is still ahead of the clock.
    Future {
        /// Unchanged base time in nanoseconds.
        base_time_ns: i64,
    },
}

impl BaseTimeSync {
    /// Base time to program.
    #[must_use]
    pub fn base_time_ns(&self) -> i64 {
        match *self {
            Self::Advanced { base_time_ns, .. } | Self::Future { base_time_ns } => base_time_ns,
        }
    }

    /// Whether the requested base time had already passed.
    #[must_use]
    pub fn was_in_past(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Move `base_time_ns` past `systim` if it has already elapsed.
///
/// With `n = floor((systim - base) / cycle)` the result is
/// `base + (n + 1) * cycle`, strictly greater than `systim`.
///
/// # Errors
///
/// - [`TsnError::InvalidCycleTime`] if the base time must be advanced but
///   the cycle time is zero.
/// - [`TsnError::ValueOutOfRange`] if the advanced base time overflows.
pub fn synchronize_base_time(
    base_time_ns: i64,
    cycle_time_ns: u64,
    systim: DeviceTime,
) -> TsnResult<BaseTimeSync> {
    let now = systim.as_nanos();
    if now <= base_time_ns {
        return Ok(BaseTimeSync::Future { base_time_ns });
    }

    if cycle_time_ns == 0 {
        return Err(TsnError::InvalidCycleTime { cycle_time_ns });
    }

    // i128 keeps (n + 1) * cycle exact for any i64 base time / u64 cycle.
    let elapsed = i128::from(now) - i128::from(base_time_ns);
    let cycle = i128::from(cycle_time_ns);
    let n = elapsed / cycle;
    let advanced = i128::from(base_time_ns) + (n + 1) * cycle;

    let synced = i64::try_from(advanced).map_err(|_| TsnError::ValueOutOfRange {
        field: "base_time",
        value: advanced,
    })?;
    // n >= 0 and n + 1 <= elapsed + 1, which fits u64 since elapsed < 2^64.
    let cycles_skipped = u64::try_from(n + 1).unwrap_or(u64::MAX);

    debug!(
        systim = now,
        requested = base_time_ns,
        base_time = synced,
        cycles_skipped,
        "Base time in the past, advanced to next cycle boundary"
    );

    Ok(BaseTimeSync::Advanced {
        base_time_ns: synced,
        cycles_skipped,
    })
}

/// Split a base time into the `(BASET_H, BASET_L)` register pair.
///
/// # Errors
///
/// Returns [`TsnError::ValueOutOfRange`] if the base time is negative or its
/// seconds do not fit 32 bits.
pub fn split_base_time(base_time_ns: i64) -> TsnResult<(u32, u32)> {
    let out_of_range = || TsnError::ValueOutOfRange {
        field: "BASET_H",
        value: i128::from(base_time_ns),
    };

    let ns = u64::try_from(base_time_ns).map_err(|_| out_of_range())?;
    let sec = u32::try_from(ns / NSEC_PER_SEC).map_err(|_| out_of_range())?;
    // Remainder is below 1e9 and always fits.
    let nsec = (ns % NSEC_PER_SEC) as u32;
    Ok((sec, nsec))
}
