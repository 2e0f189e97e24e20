//! TSN feature flags.
//!
//! The adapter tracks which TSN capabilities are active on hardware as a set
//! of [`TsnFeature`] variants:
//! QBV (time-aware gating) → PREEMPTION (frame preemption) → QAV (credit-based shaping)
//!
//! The set is a monotonic union: features are only ever added while
//! aggregating, and an empty set means TSN offload is fully disabled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single TSN capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TsnFeature {
    /// Time-aware gating (802.1Qbv scheduled windows, also implied by launch time).
    Qbv,
    /// Frame preemption (802.1Qbu / 802.3br).
    Preemption,
    /// Credit-based shaping (802.1Qav).
    Qav,
}

impl TsnFeature {
    /// Every feature, in declaration order.
    pub const ALL: [TsnFeature; 3] = [Self::Qbv, Self::Preemption, Self::Qav];

    fn bit(self) -> u8 {
        match self {
            Self::Qbv => 1 << 0,
            Self::Preemption => 1 << 1,
            Self::Qav => 1 << 2,
        }
    }
}

impl fmt::Display for TsnFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qbv => write!(f, "QBV"),
            Self::Preemption => write!(f, "PREEMPTION"),
            Self::Qav => write!(f, "QAV"),
        }
    }
}

/// Set of active TSN features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TsnFlags(u8);

impl TsnFlags {
    /// The empty set: TSN offload disabled.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add a feature to the set.
    pub fn insert(&mut self, feature: TsnFeature) {
        self.0 |= feature.bit();
    }

    /// Builder-style variant of [`TsnFlags::insert`].
    #[must_use]
    pub fn with(mut self, feature: TsnFeature) -> Self {
        self.insert(feature);
        self
    }

    /// Check whether a feature is in the set.
    #[must_use]
    pub fn contains(&self, feature: TsnFeature) -> bool {
        self.0 & feature.bit() != 0
    }

    /// Returns true if any TSN feature is active.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.0 != 0
    }

    /// Returns true if no TSN feature is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the features in the set.
    pub fn iter(&self) -> impl Iterator<Item = TsnFeature> + '_ {
        TsnFeature::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<TsnFeature> for TsnFlags {
    fn from_iter<I: IntoIterator<Item = TsnFeature>>(iter: I) -> Self {
        let mut flags = Self::empty();
        for feature in iter {
            flags.insert(feature);
        }
        flags
    }
}

impl fmt::Display for TsnFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<String> = self.iter().map(|feature| feature.to_string()).collect();
        write!(f, "{}", names.join("|"))
    }
}

impl Serialize for TsnFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for TsnFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let features = Vec::<TsnFeature>::deserialize(deserializer)?;
        Ok(features.into_iter().collect())
    }
}
