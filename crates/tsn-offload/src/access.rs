//! Register access abstraction.
//!
//! The offload engine never touches MMIO directly: it is handed a
//! [`RegisterAccess`] capability for the duration of one reset. Real
//! drivers implement it over a mapped BAR; tests and `tsnctl` use
//! [`SimulatedRegisters`], an in-memory bank with a settable live clock.

use crate::regs;
use std::collections::BTreeMap;
use tracing::trace;
use tsn_common::DeviceTime;

/// Synchronous 32-bit register read/write.
///
/// Accesses are assumed to complete without failure; the engine neither
/// retries writes nor checks for write rejection.
pub trait RegisterAccess: Send {
    /// Read the register at `offset`.
    fn read(&self, offset: u32) -> u32;

    /// Write `value` to the register at `offset`.
    fn write(&mut self, offset: u32, value: u32);
}

/// In-memory register bank for testing.
///
/// Unwritten registers read as zero. SYSTIML/SYSTIMH read back the
/// simulated device clock and ignore writes. Every write is recorded in
/// order so tests can check write sequences, not just final values.
#[derive(Debug, Clone, Default)]
pub struct SimulatedRegisters {
    /// Register contents keyed by offset.
    bank: BTreeMap<u32, u32>,
    /// Simulated live device clock.
    clock: DeviceTime,
    /// Ordered log of `(offset, value)` writes.
    write_log: Vec<(u32, u32)>,
}

impl SimulatedRegisters {
    /// Create an empty bank with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bank with the clock at `now`.
    #[must_use]
    pub fn with_clock(now: DeviceTime) -> Self {
        Self {
            clock: now,
            ..Self::default()
        }
    }

    /// Set the simulated device clock.
    pub fn set_clock(&mut self, now: DeviceTime) {
        self.clock = now;
    }

    /// Advance the simulated device clock.
    pub fn advance_clock(&mut self, ns: i64) {
        self.clock = DeviceTime(self.clock.as_nanos().saturating_add(ns));
    }

    /// Current simulated clock.
    #[must_use]
    pub fn clock(&self) -> DeviceTime {
        self.clock
    }

    /// Preload a register without recording a write (hardware state at attach).
    pub fn preload(&mut self, offset: u32, value: u32) {
        self.bank.insert(offset, value);
    }

    /// Ordered write log.
    #[must_use]
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.write_log
    }

    /// Values written to one register, in order.
    #[must_use]
    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.write_log
            .iter()
            .filter(|(reg, _)| *reg == offset)
            .map(|(_, value)| *value)
            .collect()
    }

    /// Forget recorded writes, keeping register contents.
    pub fn clear_log(&mut self) {
        self.write_log.clear();
    }

    /// Register image keyed by offset.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u32, u32> {
        self.bank.clone()
    }

    /// Register image keyed by register name.
    #[must_use]
    pub fn named_snapshot(&self) -> BTreeMap<String, u32> {
        self.bank
            .iter()
            .map(|(offset, value)| (regs::name(*offset), *value))
            .collect()
    }
}

impl RegisterAccess for SimulatedRegisters {
    fn read(&self, offset: u32) -> u32 {
        let (sec, nsec) = self.clock.split();
        match offset {
            regs::SYSTIML => nsec,
            regs::SYSTIMH => u32::try_from(sec).unwrap_or(0),
            _ => self.bank.get(&offset).copied().unwrap_or(0),
        }
    }

    fn write(&mut self, offset: u32, value: u32) {
        if matches!(offset, regs::SYSTIML | regs::SYSTIMH) {
            trace!(register = %regs::name(offset), "Ignoring write to read-only clock");
            return;
        }
        trace!(register = %regs::name(offset), value = format_args!("{value:#010x}"), "wr32");
        self.bank.insert(offset, value);
        self.write_log.push((offset, value));
    }
}
