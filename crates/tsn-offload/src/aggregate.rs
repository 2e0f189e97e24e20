//! Feature flag aggregation.
//!
//! Derives the TSN feature set a configuration asks for. Pure: reads the
//! adapter and queue configuration, never touches registers.

use crate::access::RegisterAccess;
use crate::adapter::Adapter;
use tsn_common::{TsnFeature, TsnFlags};

impl<R: RegisterAccess> Adapter<R> {
    /// Feature set requested by the current configuration.
    ///
    /// - QBV if the adapter-level toggle is on or any queue uses launch time.
    /// - PREEMPTION mirrors the adapter's preemption state.
    /// - QAV if any queue enables credit-based shaping.
    #[must_use]
    pub fn new_flags(&self) -> TsnFlags {
        let mut flags = TsnFlags::empty();

        if self.qbv_enable || self.is_any_launchtime() {
            flags.insert(TsnFeature::Qbv);
        }

        if self.preemption_active {
            flags.insert(TsnFeature::Preemption);
        }

        if self.is_cbs_enabled() {
            flags.insert(TsnFeature::Qav);
        }

        flags
    }

    fn is_any_launchtime(&self) -> bool {
        self.queues.iter().any(|q| q.launchtime_enable)
    }

    fn is_cbs_enabled(&self) -> bool {
        self.queues.iter().any(|q| q.cbs_enable)
    }
}
