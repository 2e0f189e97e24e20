//! Configuration structures for a TSN-capable adapter.
//!
//! Supports TOML deserialization with link-default values for every
//! section, so an empty file describes an adapter with TSN disabled.

use crate::error::{TsnError, TsnResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Number of transmit queues on the i225/i226 family.
pub const MAX_TX_QUEUES: usize = 4;

/// Default minimum fragment size for frame preemption, in bytes.
pub const MIN_FRAG_SIZE_DEFAULT: u32 = 68;

/// Largest minimum fragment size the 2-bit TQAVCTRL field can encode.
pub const MIN_FRAG_SIZE_MAX: u32 = 260;

/// Check that a minimum fragment size fits the hardware field.
///
/// # Errors
///
/// Returns [`TsnError::Config`] outside `68..=260` bytes.
pub fn check_min_frag_size(min_frag_size: u32) -> TsnResult<()> {
    if (MIN_FRAG_SIZE_DEFAULT..=MIN_FRAG_SIZE_MAX).contains(&min_frag_size) {
        Ok(())
    } else {
        Err(TsnError::Config(format!(
            "min_frag_size {min_frag_size} outside {MIN_FRAG_SIZE_DEFAULT}..={MIN_FRAG_SIZE_MAX}"
        )))
    }
}

/// Top-level adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Device identity and link state.
    pub device: DeviceConfig,

    /// Gate schedule configuration.
    pub schedule: ScheduleConfig,

    /// Frame preemption configuration.
    pub preemption: PreemptionConfig,

    /// Per-queue configuration, one entry per transmit queue.
    pub queues: Vec<QueueConfig>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            schedule: ScheduleConfig::default(),
            preemption: PreemptionConfig::default(),
            queues: vec![QueueConfig::default(); MAX_TX_QUEUES],
        }
    }
}

/// Device identity and link state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// PCI device id, selects the hardware variant.
    pub device_id: u16,

    /// Whether the interface is up and passing traffic.
    pub netdev_running: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: 0x15F2, // i225-LM
            netdev_running: false,
        }
    }
}

/// Queueing discipline currently configured on the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QdiscKind {
    /// No offloaded queueing discipline.
    #[default]
    None,
    /// Time-aware priority scheduler (drives gate schedules externally).
    Taprio,
    /// Earliest TxTime First (launch time).
    Etf,
    /// Credit-based shaper.
    Cbs,
    /// Multi-queue priority.
    Mqprio,
}

/// Gate schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Adapter-level time-aware gating toggle.
    pub time_aware_gating: bool,

    /// Period of the repeating gate schedule.
    #[serde(with = "humantime_serde")]
    pub cycle_time: Duration,

    /// Absolute start of cycle zero, in device clock nanoseconds.
    pub base_time_ns: i64,

    /// Queueing discipline that supplied this schedule.
    pub qdisc: QdiscKind,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time_aware_gating: false,
            cycle_time: Duration::from_secs(1),
            base_time_ns: 0,
            qdisc: QdiscKind::None,
        }
    }
}

/// Frame preemption configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreemptionConfig {
    /// Whether frame preemption is active on the link.
    pub active: bool,

    /// Minimum size of a non-final fragment, in bytes.
    pub min_frag_size: u32,
}

impl Default for PreemptionConfig {
    fn default() -> Self {
        Self {
            active: false,
            min_frag_size: MIN_FRAG_SIZE_DEFAULT,
        }
    }
}

/// Per-queue transmit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// Gate open time within the cycle, in nanoseconds.
    pub start_time_ns: u32,

    /// Gate close time within the cycle, in nanoseconds.
    /// Must lie within `[0, cycle_time]`.
    pub end_time_ns: u32,

    /// Per-packet launch time enforced by hardware.
    pub launchtime_enable: bool,

    /// Credit-based shaping on this queue.
    pub cbs_enable: bool,

    /// CBS idle slope in kbps.
    pub idleslope_kbps: u32,

    /// CBS hi-credit in credit units.
    pub hicredit: u32,

    /// Frames on this queue may be preempted.
    pub preemptible: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            start_time_ns: 0,
            end_time_ns: 1_000_000_000,
            launchtime_enable: false,
            cbs_enable: false,
            idleslope_kbps: 0,
            hicredit: 0,
            preemptible: false,
        }
    }
}

impl AdapterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the structural constraints the offload engine relies on.
    ///
    /// Gate windows that overrun the cycle are reported but not rejected;
    /// keeping them inside the cycle is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] if the queue count is outside `1..=4`
    /// or the minimum fragment size does not fit its register field.
    pub fn validate(&self) -> TsnResult<()> {
        if self.queues.is_empty() || self.queues.len() > MAX_TX_QUEUES {
            return Err(TsnError::Config(format!(
                "expected 1..={MAX_TX_QUEUES} transmit queues, got {}",
                self.queues.len()
            )));
        }

        check_min_frag_size(self.preemption.min_frag_size)?;

        let cycle_ns = self.schedule.cycle_time.as_nanos();
        for (index, queue) in self.queues.iter().enumerate() {
            if u128::from(queue.end_time_ns) > cycle_ns {
                warn!(
                    queue = index,
                    end_time_ns = queue.end_time_ns,
                    cycle_ns = %cycle_ns,
                    "Gate window ends after the cycle"
                );
            }
        }

        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.schedule.cycle_time, Duration::from_secs(1));
        assert_eq!(config.queues.len(), MAX_TX_QUEUES);
        assert!(!config.schedule.time_aware_gating);
        assert_eq!(config.preemption.min_frag_size, 68);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_frag_size_bounds() {
        let mut config = AdapterConfig::default();
        for size in [68, 128, 260] {
            config.preemption.min_frag_size = size;
            assert!(config.validate().is_ok(), "{size} rejected");
        }
        for size in [0, 64, 261, 320] {
            config.preemption.min_frag_size = size;
            assert!(matches!(config.validate(), Err(TsnError::Config(_))), "{size} accepted");
        }
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [device]
            device_id = 0x125B
            netdev_running = true

            [schedule]
            time_aware_gating = true
            cycle_time = "1ms"
            base_time_ns = 5000000000
            qdisc = "taprio"

            [preemption]
            active = true
            min_frag_size = 128

            [[queues]]
            start_time_ns = 0
            end_time_ns = 500000
            cbs_enable = true
            idleslope_kbps = 100000
            hicredit = 30

            [[queues]]
            start_time_ns = 500000
            end_time_ns = 1000000
            launchtime_enable = true
            preemptible = true
        "#;

        let config = AdapterConfig::from_toml(toml).unwrap();
        assert_eq!(config.device.device_id, 0x125B);
        assert!(config.device.netdev_running);
        assert_eq!(config.schedule.cycle_time, Duration::from_millis(1));
        assert_eq!(config.schedule.base_time_ns, 5_000_000_000);
        assert_eq!(config.schedule.qdisc, QdiscKind::Taprio);
        assert!(config.preemption.active);
        assert_eq!(config.queues.len(), 2);
        assert_eq!(config.queues[0].idleslope_kbps, 100_000);
        assert!(config.queues[1].launchtime_enable);
        // Unset queue fields fall back to defaults
        assert!(!config.queues[1].cbs_enable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_queue_count() {
        let mut config = AdapterConfig::default();
        config.queues.clear();
        assert!(matches!(config.validate(), Err(TsnError::Config(_))));

        config.queues = vec![QueueConfig::default(); MAX_TX_QUEUES + 1];
        assert!(matches!(config.validate(), Err(TsnError::Config(_))));
    }

    #[test]
    fn test_window_past_cycle_is_not_rejected() {
        let mut config = AdapterConfig::default();
        config.schedule.cycle_time = Duration::from_micros(100);
        // Default end time is one full second
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = AdapterConfig::default();
        config.schedule.qdisc = QdiscKind::Etf;
        let toml = config.to_toml().unwrap();
        let parsed = AdapterConfig::from_toml(&toml).unwrap();
        assert_eq!(config.schedule.cycle_time, parsed.schedule.cycle_time);
        assert_eq!(parsed.schedule.qdisc, QdiscKind::Etf);
        assert_eq!(config.queues, parsed.queues);
    }

    #[test]
    fn test_missing_file() {
        let err = AdapterConfig::from_file(std::path::Path::new("/nonexistent/tsn.toml"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }
}
