//! Device clock time helpers.
//!
//! The device clock is a signed nanosecond count split across a seconds
//! register and a sub-second nanoseconds register.

/// Nanoseconds per second.
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// A live sample of the device clock, in nanoseconds since the clock epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DeviceTime(pub i64);

impl DeviceTime {
    /// Build a time from the seconds and nanoseconds register pair.
    #[must_use]
    pub fn from_parts(sec: u32, nsec: u32) -> Self {
        Self(i64::from(sec) * NSEC_PER_SEC as i64 + i64::from(nsec))
    }

    /// Nanoseconds since the clock epoch.
    #[must_use]
    pub fn as_nanos(self) -> i64 {
        self.0
    }

    /// Split into `(seconds, nanoseconds)`, flooring towards negative infinity.
    #[must_use]
    pub fn split(self) -> (i64, u32) {
        let nsec_per_sec = NSEC_PER_SEC as i64;
        let sec = self.0.div_euclid(nsec_per_sec);
        // rem_euclid is always in 0..1e9
        let nsec = self.0.rem_euclid(nsec_per_sec) as u32;
        (sec, nsec)
    }
}
