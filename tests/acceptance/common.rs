//! Common utilities for acceptance tests.
//!
//! Provides helpers for:
//! - Writing adapter configurations to temporary TOML files
//! - Building engines on a simulated register bank
//! - Reading back programmed schedule values

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tsn_common::{AdapterConfig, DeviceTime};
use tsn_offload::{regs, Adapter, RegisterAccess, SimulatedRegisters, TsnOffload};

/// Upper bound for deferred resets to drain.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Write `content` to a temporary TOML file.
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file.flush().expect("flush temp config");
    file
}

/// Load a configuration the way tools do: from a file on disk.
pub fn load(content: &str) -> AdapterConfig {
    let file = write_config(content);
    AdapterConfig::from_file(file.path()).expect("parse config")
}

/// Build an engine from `config` with the live clock at `now`.
pub fn engine(config: &AdapterConfig, now: i64) -> TsnOffload<SimulatedRegisters> {
    engine_with_bank(config, SimulatedRegisters::with_clock(DeviceTime(now)))
}

/// Build an engine from `config` on a prepared register bank.
pub fn engine_with_bank(
    config: &AdapterConfig,
    bank: SimulatedRegisters,
) -> TsnOffload<SimulatedRegisters> {
    let adapter = Adapter::from_config(bank, config).expect("build adapter");
    TsnOffload::new(adapter).expect("start engine")
}

/// Read one register from the engine's bank.
pub fn read(offload: &TsnOffload<SimulatedRegisters>, offset: u32) -> u32 {
    offload.with_adapter(|adapter| adapter.regs().read(offset))
}

/// Programmed base time in nanoseconds.
pub fn base_time(offload: &TsnOffload<SimulatedRegisters>) -> i64 {
    let sec = i64::from(read(offload, regs::BASET_H));
    let nsec = i64::from(read(offload, regs::BASET_L));
    sec * 1_000_000_000 + nsec
}

/// Two-queue i225 configuration: queue 0 shaped and gated in the first
/// half of a 1 ms cycle, queue 1 using launch time in the second half.
pub const I225_TWO_QUEUE: &str = r#"
[device]
device_id = 0x15F2
netdev_running = false

[schedule]
time_aware_gating = true
cycle_time = "1ms"
base_time_ns = 0
qdisc = "taprio"

[preemption]
active = true
min_frag_size = 128

[[queues]]
start_time_ns = 0
end_time_ns = 500000
cbs_enable = true
idleslope_kbps = 100000
hicredit = 0

[[queues]]
start_time_ns = 500000
end_time_ns = 1000000
launchtime_enable = true
preemptible = true
"#;
