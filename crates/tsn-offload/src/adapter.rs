//! Adapter state: the TSN configuration of one network device.
//!
//! The configuration layer mutates the adapter (queue windows, shaping,
//! schedule) and then asks for a reset; the engine reads that state,
//! programs registers, and records the flags of what was actually applied.

use crate::access::RegisterAccess;
use serde::{Deserialize, Serialize};
use std::fmt;
use tsn_common::{
    check_min_frag_size, AdapterConfig, QdiscKind, QueueConfig, ResetCounters, TsnError,
    TsnFlags, TsnResult, MAX_TX_QUEUES, MIN_FRAG_SIZE_DEFAULT,
};

/// Hardware variant of the i225/i226 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceVariant {
    /// i225.
    I225,
    /// i226.
    I226,
    /// Other igc parts (I220-V, blank NVM) with no variant-specific handling.
    #[serde(rename = "igc")]
    Other,
}

impl DeviceVariant {
    /// Map a PCI device id to its variant.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] for ids outside the i225/i226 family.
    pub fn from_device_id(device_id: u16) -> TsnResult<Self> {
        match device_id {
            // LM, V, I, K, K2, LMvP, IT
            0x15F2 | 0x15F3 | 0x15F8 | 0x3100 | 0x3101 | 0x5502 | 0x0D9F => Ok(Self::I225),
            // LM, V, IT, LMvP, K
            0x125B | 0x125C | 0x125D | 0x5503 | 0x5504 => Ok(Self::I226),
            // I220-V, i225 blank NVM, i226 blank NVM
            0x15F7 | 0x15FD | 0x125F => Ok(Self::Other),
            other => Err(TsnError::Config(format!(
                "unsupported device id {other:#06x}"
            ))),
        }
    }

    /// Whether the hardware can arm a gate schedule for a future base time
    /// (the FUTSCDDIS sequence).
    #[must_use]
    pub fn supports_future_schedule(&self) -> bool {
        matches!(self, Self::I226)
    }

    /// Whether reprogramming TSN registers must not race live traffic.
    #[must_use]
    pub fn requires_quiescent_reset(&self) -> bool {
        matches!(self, Self::I225)
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I225 => write!(f, "i225"),
            Self::I226 => write!(f, "i226"),
            Self::Other => write!(f, "igc"),
        }
    }
}

/// TSN state of one adapter, together with its register capability.
#[derive(Debug)]
pub struct Adapter<R> {
    pub(crate) regs: R,
    pub(crate) variant: DeviceVariant,
    pub(crate) netdev_running: bool,
    /// Flags of the last successfully applied configuration.
    pub(crate) flags: TsnFlags,
    pub(crate) qbv_enable: bool,
    pub(crate) preemption_active: bool,
    pub(crate) min_frag_size: u32,
    pub(crate) cycle_time_ns: u64,
    pub(crate) base_time_ns: i64,
    pub(crate) qdisc: QdiscKind,
    pub(crate) queues: Vec<QueueConfig>,
    pub(crate) counters: ResetCounters,
}

impl<R: RegisterAccess> Adapter<R> {
    /// Create an adapter with `num_queues` default queues and TSN disabled.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] if `num_queues` is outside `1..=4`.
    pub fn new(regs: R, variant: DeviceVariant, num_queues: usize) -> TsnResult<Self> {
        if num_queues == 0 || num_queues > MAX_TX_QUEUES {
            return Err(TsnError::Config(format!(
                "expected 1..={MAX_TX_QUEUES} transmit queues, got {num_queues}"
            )));
        }

        Ok(Self {
            regs,
            variant,
            netdev_running: false,
            flags: TsnFlags::empty(),
            qbv_enable: false,
            preemption_active: false,
            min_frag_size: MIN_FRAG_SIZE_DEFAULT,
            cycle_time_ns: 1_000_000_000,
            base_time_ns: 0,
            qdisc: QdiscKind::None,
            queues: vec![QueueConfig::default(); num_queues],
            counters: ResetCounters::default(),
        })
    }

    /// Create an adapter from a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] for an unknown device id or invalid queue count.
    pub fn from_config(regs: R, config: &AdapterConfig) -> TsnResult<Self> {
        let variant = DeviceVariant::from_device_id(config.device.device_id)?;
        let mut adapter = Self::new(regs, variant, config.queues.len())?;
        adapter.load_config(config)?;
        Ok(adapter)
    }

    /// Replace the requested configuration. Nothing is programmed until
    /// the next reset.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] if the configuration fails validation or
    /// its queue count differs from this adapter's.
    pub fn load_config(&mut self, config: &AdapterConfig) -> TsnResult<()> {
        config.validate()?;
        if config.queues.len() != self.queues.len() {
            return Err(TsnError::Config(format!(
                "configuration has {} queues, adapter has {}",
                config.queues.len(),
                self.queues.len()
            )));
        }

        self.netdev_running = config.device.netdev_running;
        self.qbv_enable = config.schedule.time_aware_gating;
        self.cycle_time_ns = u64::try_from(config.schedule.cycle_time.as_nanos()).unwrap_or(u64::MAX);
        self.base_time_ns = config.schedule.base_time_ns;
        self.qdisc = config.schedule.qdisc;
        self.preemption_active = config.preemption.active;
        self.min_frag_size = config.preemption.min_frag_size;
        self.queues.clone_from(&config.queues);
        Ok(())
    }

    /// Register capability.
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Mutable register capability.
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Hardware variant.
    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    /// Flags of the last successfully applied configuration.
    pub fn flags(&self) -> TsnFlags {
        self.flags
    }

    /// Reset-path counters, including schedule change errors.
    pub fn counters(&self) -> &ResetCounters {
        &self.counters
    }

    /// Number of missed schedule windows caused by late schedule updates.
    pub fn schedule_change_errors(&self) -> u64 {
        self.counters.schedule_change_errors
    }

    /// Transmit queue configurations.
    pub fn queues(&self) -> &[QueueConfig] {
        &self.queues
    }

    /// Number of transmit queues.
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }

    /// Mutable access to one queue's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::QueueIndex`] if `index` is out of range.
    pub fn queue_mut(&mut self, index: usize) -> TsnResult<&mut QueueConfig> {
        let queues = self.queues.len();
        self.queues
            .get_mut(index)
            .ok_or(TsnError::QueueIndex { index, queues })
    }

    /// Whether the interface is up and passing traffic.
    pub fn netdev_running(&self) -> bool {
        self.netdev_running
    }

    /// Record link state changes from the netdev layer.
    pub fn set_netdev_running(&mut self, running: bool) {
        self.netdev_running = running;
    }

    /// Adapter-level time-aware gating toggle.
    pub fn set_time_aware_gating(&mut self, enabled: bool) {
        self.qbv_enable = enabled;
    }

    /// Frame preemption state and minimum fragment size.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Config`] if `min_frag_size` is outside `68..=260`;
    /// the adapter is left unchanged.
    pub fn set_preemption(&mut self, active: bool, min_frag_size: u32) -> TsnResult<()> {
        check_min_frag_size(min_frag_size)?;
        self.preemption_active = active;
        self.min_frag_size = min_frag_size;
        Ok(())
    }

    /// Whether frame preemption is active.
    pub fn preemption_active(&self) -> bool {
        self.preemption_active
    }

    /// Current minimum fragment size.
    pub fn min_frag_size(&self) -> u32 {
        self.min_frag_size
    }

    /// Set the gate schedule and the queueing discipline that supplied it.
    pub fn set_schedule(&mut self, cycle_time_ns: u64, base_time_ns: i64, qdisc: QdiscKind) {
        self.cycle_time_ns = cycle_time_ns;
        self.base_time_ns = base_time_ns;
        self.qdisc = qdisc;
    }

    /// Requested cycle time in nanoseconds.
    pub fn cycle_time_ns(&self) -> u64 {
        self.cycle_time_ns
    }

    /// Requested base time in device clock nanoseconds.
    pub fn base_time_ns(&self) -> i64 {
        self.base_time_ns
    }

    /// Queueing discipline that supplied the schedule.
    pub fn qdisc(&self) -> QdiscKind {
        self.qdisc
    }
}
