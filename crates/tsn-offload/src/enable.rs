//! Offload enable: program buffers, queues, shaping and the gate schedule.
//!
//! Register writes are not transactional. A failure in the schedule
//! synchronization step leaves the buffer and queue registers already
//! programmed; the caller decides what happens to the adapter flags.

use crate::access::RegisterAccess;
use crate::adapter::Adapter;
use crate::cbs::{hicredit_to_register, idleslope_to_cbs_value};
use crate::regs;
use crate::sync::{split_base_time, synchronize_base_time};
use tracing::{debug, warn};
use tsn_common::{DeviceTime, QdiscKind, QueueConfig, TsnError, TsnResult, NSEC_PER_SEC};

/// Number of queues with a credit-based shaper in hardware.
pub const CBS_QUEUES: usize = 2;

/// Base TXQCTL value for one queue, before the shaper selector is applied.
#[must_use]
pub fn queue_control(queue: &QueueConfig, preemption_active: bool) -> u32 {
    let mut txqctl = regs::TXQCTL_STRICT_CYCLE | regs::TXQCTL_STRICT_END;

    if queue.launchtime_enable {
        txqctl |= regs::TXQCTL_QUEUE_MODE_LAUNCHT;
    }

    if preemption_active && queue.preemptible {
        txqctl |= regs::TXQCTL_PREEMPTABLE;
    }

    txqctl
}

/// Encode a minimum fragment size into the 2-bit TQAVCTRL field value.
#[must_use]
pub fn min_frag_multiplier(min_frag_size: u32) -> u32 {
    let mult = (min_frag_size / 64).saturating_sub(1);
    (mult << regs::TQAVCTRL_MIN_FRAG_SHIFT) & regs::TQAVCTRL_MIN_FRAG_MASK
}

impl<R: RegisterAccess> Adapter<R> {
    /// Program the full TSN configuration into hardware.
    ///
    /// Does not touch the adapter flags; committing them is the reset
    /// orchestrator's job.
    ///
    /// # Errors
    ///
    /// - [`TsnError::ValueOutOfRange`] if an idle slope, the cycle time or the
    ///   synchronized base time does not fit its register.
    /// - [`TsnError::InvalidCycleTime`] if the base time is in the past and
    ///   the cycle time is zero.
    pub fn enable_offload(&mut self) -> TsnResult<()> {
        debug!(
            variant = %self.variant,
            queues = self.queues.len(),
            cycle_time_ns = self.cycle_time_ns,
            base_time_ns = self.base_time_ns,
            "Enabling TSN offload"
        );

        self.program_buffers();
        self.program_queues()?;

        let mut tqavctrl = self.regs.read(regs::TQAVCTRL)
            & !(regs::TQAVCTRL_FUTSCDDIS | regs::TQAVCTRL_MIN_FRAG_MASK | regs::TQAVCTRL_PREEMPT_ENA);
        let tsn_mode_reconfig = tqavctrl & regs::TQAVCTRL_TRANSMIT_MODE_TSN != 0;

        tqavctrl |= regs::TQAVCTRL_TRANSMIT_MODE_TSN | regs::TQAVCTRL_ENHANCED_QAV;
        if self.preemption_active {
            tqavctrl |= regs::TQAVCTRL_PREEMPT_ENA;
        }
        tqavctrl |= min_frag_multiplier(self.min_frag_size);

        self.program_schedule(tqavctrl, tsn_mode_reconfig)
    }

    fn program_buffers(&mut self) {
        self.regs.write(regs::GTXOFFSET, regs::GTXOFFSET_TSN);
        self.regs.write(regs::TSAUXC, 0);
        self.regs.write(regs::DTXMXPKTSZ, regs::DTXMXPKTSZ_TSN);
        self.regs.write(regs::TXPBS, regs::TXPBSIZE_TSN);

        let rxpbs = self.regs.read(regs::RXPBS) & !regs::RXPBSIZE_SIZE_MASK;
        self.regs.write(regs::RXPBS, rxpbs | regs::RXPBSIZE_TSN);
    }

    fn program_queues(&mut self) -> TsnResult<()> {
        for (i, queue) in self.queues.iter().enumerate() {
            self.regs.write(regs::stqt(i), queue.start_time_ns);
            self.regs.write(regs::endqt(i), queue.end_time_ns);

            let mut txqctl = queue_control(queue, self.preemption_active);

            // Only queues 0 and 1 have a shaper; others keep strict priority.
            if i < CBS_QUEUES {
                let tqavcc = self.regs.read(regs::tqavcc(i));

                if queue.cbs_enable {
                    txqctl |= if i == 0 {
                        regs::TXQCTL_QAV_SEL_CBS0
                    } else {
                        regs::TXQCTL_QAV_SEL_CBS1
                    };

                    let cbs_value = idleslope_to_cbs_value(queue.idleslope_kbps)?;
                    let tqavcc = (tqavcc & !regs::TQAVCC_IDLESLOPE_MASK)
                        | u32::from(cbs_value)
                        | regs::TQAVCC_KEEP_CREDITS;
                    self.regs.write(regs::tqavcc(i), tqavcc);
                    self.regs
                        .write(regs::tqavhc(i), hicredit_to_register(queue.hicredit));
                } else {
                    txqctl &= !regs::TXQCTL_QAV_SEL_MASK;

                    let tqavcc =
                        tqavcc & !(regs::TQAVCC_IDLESLOPE_MASK | regs::TQAVCC_KEEP_CREDITS);
                    self.regs.write(regs::tqavcc(i), tqavcc);
                    self.regs.write(regs::tqavhc(i), 0);
                }
            }

            self.regs.write(regs::txqctl(i), txqctl);
        }

        Ok(())
    }

    fn program_schedule(&mut self, mut tqavctrl: u32, tsn_mode_reconfig: bool) -> TsnResult<()> {
        let cycle = u32::try_from(self.cycle_time_ns).map_err(|_| TsnError::ValueOutOfRange {
            field: "QBVCYCLET",
            value: i128::from(self.cycle_time_ns),
        })?;

        let systim = self.read_systim();
        let sync = synchronize_base_time(self.base_time_ns, self.cycle_time_ns, systim)?;
        let base_time = sync.base_time_ns();

        if sync.was_in_past() {
            let schedule_running =
                self.regs.read(regs::BASET_H) != 0 || self.regs.read(regs::BASET_L) != 0;

            // The new schedule takes effect one cycle late; count the miss.
            if schedule_running && self.qdisc == QdiscKind::Taprio && tsn_mode_reconfig {
                self.counters.record_schedule_change_error();
                warn!(
                    systim = systim.as_nanos(),
                    requested = self.base_time_ns,
                    base_time,
                    errors = self.counters.schedule_change_errors,
                    "Gate schedule change missed its base time"
                );
            }
        } else if self.variant.supports_future_schedule() {
            let schedule_running =
                self.regs.read(regs::BASET_H) != 0 || self.regs.read(regs::BASET_L) != 0;
            if !schedule_running {
                tqavctrl |= regs::TQAVCTRL_FUTSCDDIS;
            }
        }

        let (baset_h, baset_l) = split_base_time(base_time)?;

        self.regs.write(regs::TQAVCTRL, tqavctrl);
        self.regs.write(regs::QBVCYCLET_S, cycle);
        self.regs.write(regs::QBVCYCLET, cycle);
        self.regs.write(regs::BASET_H, baset_h);

        // FUTSCDDIS arms on a zero BASET_L write followed by the real value.
        if tqavctrl & regs::TQAVCTRL_FUTSCDDIS != 0 {
            self.regs.write(regs::BASET_L, 0);
        }
        self.regs.write(regs::BASET_L, baset_l);

        debug!(
            tqavctrl = format_args!("{tqavctrl:#010x}"),
            base_time,
            future_schedule = tqavctrl & regs::TQAVCTRL_FUTSCDDIS != 0,
            "Gate schedule programmed"
        );

        Ok(())
    }

    /// Sample the live clock. SYSTIML is read first; it latches SYSTIMH.
    fn read_systim(&self) -> DeviceTime {
        let nsec = self.regs.read(regs::SYSTIML);
        let sec = self.regs.read(regs::SYSTIMH);
        let now = u64::from(sec) * NSEC_PER_SEC + u64::from(nsec);
        DeviceTime(i64::try_from(now).unwrap_or(i64::MAX))
    }
}
