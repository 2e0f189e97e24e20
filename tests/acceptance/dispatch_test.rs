//! Apply dispatcher acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Running i225 adapters reset on the worker, everything else in place
//! - Bursts of dispatches never run more resets than they requested
//! - After the queue drains, hardware reflects the latest configuration
//! - Deferred failures are counted and leave the committed flags alone

use super::common::{engine, load, read, DRAIN_TIMEOUT, I225_TWO_QUEUE};
use std::sync::Arc;
use std::thread;
use tsn_common::{QdiscKind, TsnFeature};
use tsn_offload::{regs, ApplyOutcome};

#[test]
fn test_dispatch_mode_by_variant_and_link() {
    let cases = [
        (0x15F2, false, ApplyOutcome::Applied),
        (0x15F2, true, ApplyOutcome::Deferred),
        (0x125B, false, ApplyOutcome::Applied),
        (0x125B, true, ApplyOutcome::Applied),
    ];

    for (device_id, running, expected) in cases {
        let mut config = load(I225_TWO_QUEUE);
        config.device.device_id = device_id;
        config.device.netdev_running = running;
        let offload = engine(&config, 0);

        assert_eq!(offload.apply(), expected, "{device_id:#06x} running={running}");
        assert!(offload.wait_idle(DRAIN_TIMEOUT));
        assert_eq!(offload.stats().enables, 1);
    }
}

#[test]
fn test_burst_of_dispatches_is_coalesced() {
    let mut config = load(I225_TWO_QUEUE);
    config.device.netdev_running = true;
    let offload = Arc::new(engine(&config, 0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let offload = Arc::clone(&offload);
            thread::spawn(move || {
                for _ in 0..25 {
                    assert_eq!(offload.apply(), ApplyOutcome::Deferred);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(offload.wait_idle(DRAIN_TIMEOUT));

    let stats = offload.stats();
    assert_eq!(stats.deferred_resets + stats.coalesced_resets, 200);
    assert_eq!(stats.resets_total, stats.deferred_resets);
    assert_eq!(stats.reset_failures, 0);
    assert!(stats.flags.contains(TsnFeature::Qbv));
}

#[test]
fn test_latest_configuration_wins() {
    let mut config = load(I225_TWO_QUEUE);
    config.device.netdev_running = true;
    let offload = engine(&config, 0);

    for end_time in [100_000, 200_000, 300_000, 400_000] {
        offload.with_adapter(|adapter| {
            adapter.queue_mut(0).unwrap().end_time_ns = end_time;
        });
        offload.apply();
    }
    assert!(offload.wait_idle(DRAIN_TIMEOUT));

    assert_eq!(read(&offload, regs::endqt(0)), 400_000);
}

#[test]
fn test_deferred_failure_keeps_flags() {
    let mut config = load(I225_TWO_QUEUE);
    config.device.netdev_running = true;
    let offload = engine(&config, 0);

    offload.apply();
    assert!(offload.wait_idle(DRAIN_TIMEOUT));
    let committed = offload.stats().flags;

    offload.with_adapter(|adapter| {
        adapter.set_schedule(10_000_000_000, 0, QdiscKind::Taprio);
        adapter.queue_mut(0).unwrap().cbs_enable = false;
    });
    assert_eq!(offload.apply(), ApplyOutcome::Deferred);
    assert!(offload.wait_idle(DRAIN_TIMEOUT));

    let stats = offload.stats();
    assert_eq!(stats.reset_failures, 1);
    assert_eq!(stats.flags, committed);
    assert!(stats.flags.contains(TsnFeature::Qav));
}

#[test]
fn test_link_going_down_switches_to_synchronous() {
    let mut config = load(I225_TWO_QUEUE);
    config.device.netdev_running = true;
    let offload = engine(&config, 0);
    assert_eq!(offload.apply(), ApplyOutcome::Deferred);
    assert!(offload.wait_idle(DRAIN_TIMEOUT));

    offload.with_adapter(|adapter| adapter.set_netdev_running(false));
    assert_eq!(offload.apply(), ApplyOutcome::Applied);
    assert_eq!(offload.stats().resets_total, 2);
}
