//! Offload disable: return TSN registers to link defaults.

use crate::access::RegisterAccess;
use crate::adapter::Adapter;
use crate::regs;
use tracing::debug;
use tsn_common::{TsnFlags, MIN_FRAG_SIZE_DEFAULT, NSEC_PER_SEC};

/// Gate end time that keeps a queue open for a whole one-second cycle.
const ENDQT_ALWAYS_OPEN: u32 = NSEC_PER_SEC as u32;

impl<R: RegisterAccess> Adapter<R> {
    /// Reset every TSN register to its non-TSN default and clear the flags.
    ///
    /// Idempotent, and cannot fail. The live base-time registers are left
    /// as they are.
    pub fn disable_offload(&mut self) {
        debug!(queues = self.queues.len(), "Disabling TSN offload");

        self.min_frag_size = MIN_FRAG_SIZE_DEFAULT;

        self.regs.write(regs::TXPBS, regs::TXPBSIZE_DEFAULT);
        self.regs.write(regs::DTXMXPKTSZ, regs::DTXMXPKTSZ_DEFAULT);

        let rxpbs = self.regs.read(regs::RXPBS) & !regs::RXPBSIZE_SIZE_MASK;
        self.regs.write(regs::RXPBS, rxpbs | regs::RXPBSIZE_DEFAULT);

        let tqavctrl = self.regs.read(regs::TQAVCTRL)
            & !(regs::TQAVCTRL_TRANSMIT_MODE_TSN
                | regs::TQAVCTRL_ENHANCED_QAV
                | regs::TQAVCTRL_FUTSCDDIS
                | regs::TQAVCTRL_PREEMPT_ENA
                | regs::TQAVCTRL_MIN_FRAG_MASK);
        self.regs.write(regs::TQAVCTRL, tqavctrl);

        for i in 0..self.queues.len() {
            self.regs.write(regs::txqctl(i), 0);
            self.regs.write(regs::stqt(i), 0);
            self.regs.write(regs::endqt(i), ENDQT_ALWAYS_OPEN);
        }

        self.regs.write(regs::QBVCYCLET_S, 0);
        self.regs.write(regs::QBVCYCLET, ENDQT_ALWAYS_OPEN);

        self.flags = TsnFlags::empty();
    }
}
