use thiserror::Error;

/// TSN offload error types covering configuration and hardware apply failures.
///
/// A missed schedule window is deliberately absent: it is a counted,
/// non-fatal event (see `TsnStats::schedule_change_errors`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TsnError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The gate schedule has a zero-length cycle and cannot be synchronized.
    #[error("invalid cycle time: {cycle_time_ns}ns")]
    InvalidCycleTime {
        /// Offending cycle time in nanoseconds.
        cycle_time_ns: u64,
    },

    /// A computed value does not fit the hardware field it is written to.
    #[error("{field} out of range: {value}")]
    ValueOutOfRange {
        /// Name of the hardware field.
        field: &'static str,
        /// Value that did not fit.
        value: i128,
    },

    /// A queue index beyond the configured queue count was addressed.
    #[error("queue index {index} out of range ({queues} queues)")]
    QueueIndex {
        /// Requested queue index.
        index: usize,
        /// Number of configured queues.
        queues: usize,
    },

    /// The deferred reset worker could not be started or has gone away.
    #[error("reset worker error: {0}")]
    Worker(String),
}

/// Convenience type alias for TSN offload operations.
pub type TsnResult<T> = Result<T, TsnError>;
