//! Gate schedule acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A file-based configuration programs buffers, queues and shapers
//! - Past base times land on the next cycle boundary after the clock
//! - Late taprio updates on a live schedule are counted, nothing else is
//! - i226 arms future schedules with the double BASET_L write
//! - Turning every feature off returns the bank to link defaults

use super::common::{base_time, engine, engine_with_bank, load, read, I225_TWO_QUEUE};
use tsn_common::{AdapterConfig, DeviceTime, TsnFeature};
use tsn_offload::{regs, ApplyOutcome, RegisterAccess, SimulatedRegisters};

#[test]
fn test_two_queue_config_programs_hardware() {
    let config = load(I225_TWO_QUEUE);
    let offload = engine(&config, 0);

    assert_eq!(offload.apply(), ApplyOutcome::Applied);

    let stats = offload.stats();
    for feature in TsnFeature::ALL {
        assert!(stats.flags.contains(feature), "{feature} not committed");
    }

    assert_eq!(read(&offload, regs::TXPBS), regs::TXPBSIZE_TSN);
    assert_eq!(read(&offload, regs::endqt(0)), 500_000);
    assert_eq!(read(&offload, regs::stqt(1)), 500_000);
    assert_eq!(read(&offload, regs::tqavcc(0)) & regs::TQAVCC_IDLESLOPE_MASK, 2442);
    assert_eq!(read(&offload, regs::tqavhc(0)), 0x8000_0000);

    let txqctl1 = read(&offload, regs::txqctl(1));
    assert_ne!(txqctl1 & regs::TXQCTL_QUEUE_MODE_LAUNCHT, 0);
    assert_ne!(txqctl1 & regs::TXQCTL_PREEMPTABLE, 0);
    assert_eq!(txqctl1 & regs::TXQCTL_QAV_SEL_MASK, 0);

    let tqavctrl = read(&offload, regs::TQAVCTRL);
    assert_ne!(tqavctrl & regs::TQAVCTRL_PREEMPT_ENA, 0);
    assert_eq!(tqavctrl & regs::TQAVCTRL_MIN_FRAG_MASK, 1 << regs::TQAVCTRL_MIN_FRAG_SHIFT);
}

#[test]
fn test_base_time_synchronized_to_clock() {
    let config = load(I225_TWO_QUEUE);

    for (now, expected) in [(0, 0), (1_000_000, 2_000_000), (2_500_000, 3_000_000)] {
        let offload = engine(&config, now);
        offload.apply();
        assert_eq!(base_time(&offload), expected, "clock at {now}");
    }
}

#[test]
fn test_live_taprio_update_counts_missed_window() {
    let config = load(I225_TWO_QUEUE);
    let mut bank = SimulatedRegisters::with_clock(DeviceTime(2_500_000));
    bank.preload(regs::TQAVCTRL, regs::TQAVCTRL_TRANSMIT_MODE_TSN);
    bank.preload(regs::BASET_L, 250_000);
    let offload = engine_with_bank(&config, bank);

    offload.apply();
    assert_eq!(offload.stats().schedule_change_errors, 1);
    // The schedule is still programmed, one cycle late
    assert_eq!(base_time(&offload), 3_000_000);
}

#[test]
fn test_first_enable_is_not_a_missed_window() {
    let config = load(I225_TWO_QUEUE);
    let offload = engine(&config, 2_500_000);

    offload.apply();
    assert_eq!(offload.stats().schedule_change_errors, 0);

    // The second apply is a live reconfiguration on a running schedule
    offload.with_adapter(|adapter| adapter.regs_mut().advance_clock(10_000_000));
    offload.apply();
    assert_eq!(offload.stats().schedule_change_errors, 1);
}

#[test]
fn test_i226_future_schedule() {
    let mut config = load(I225_TWO_QUEUE);
    config.device.device_id = 0x125B;
    config.schedule.base_time_ns = 5_000_000_000;
    let offload = engine(&config, 1_000_000_000);

    assert_eq!(offload.apply(), ApplyOutcome::Applied);

    assert_ne!(read(&offload, regs::TQAVCTRL) & regs::TQAVCTRL_FUTSCDDIS, 0);
    assert_eq!(read(&offload, regs::BASET_H), 5);
    let writes = offload.with_adapter(|adapter| adapter.regs().writes_to(regs::BASET_L));
    assert_eq!(writes, vec![0, 0]);
}

#[test]
fn test_all_features_off_restores_defaults() {
    let config = load(I225_TWO_QUEUE);
    let offload = engine(&config, 0);
    offload.apply();

    let reference = {
        let mut adapter = tsn_offload::Adapter::new(
            SimulatedRegisters::new(),
            tsn_offload::DeviceVariant::I225,
            2,
        )
        .unwrap();
        adapter.disable_offload();
        adapter.regs().clone()
    };

    offload.with_adapter(|adapter| {
        adapter.load_config(&disabled(&config)).unwrap();
    });
    offload.apply();

    let stats = offload.stats();
    assert!(stats.flags.is_empty());
    assert_eq!((stats.enables, stats.disables), (1, 1));
    for offset in [regs::TXPBS, regs::DTXMXPKTSZ, regs::QBVCYCLET, regs::endqt(0)] {
        assert_eq!(read(&offload, offset), reference.read(offset), "{}", regs::name(offset));
    }
    assert_eq!(read(&offload, regs::TQAVCTRL), 0);
}

/// Same queues as `config` with every feature switched off.
fn disabled(config: &AdapterConfig) -> AdapterConfig {
    let mut config = config.clone();
    config.schedule.time_aware_gating = false;
    config.preemption.active = false;
    for queue in &mut config.queues {
        queue.launchtime_enable = false;
        queue.cbs_enable = false;
    }
    config
}
