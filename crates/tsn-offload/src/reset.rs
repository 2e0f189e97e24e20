//! Reset orchestration: pick disable or enable and commit the flags.

use crate::access::RegisterAccess;
use crate::adapter::Adapter;
use tracing::{info, warn};
use tsn_common::{ResetKind, TsnResult};

impl<R: RegisterAccess> Adapter<R> {
    /// Bring hardware in line with the current configuration.
    ///
    /// With no feature requested the offload is disabled. Otherwise it is
    /// enabled, and the adapter flags are replaced only once programming
    /// succeeds. Disabling is not attempted after a failed enable.
    ///
    /// The caller must hold exclusive access to the adapter for the
    /// duration of the call.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Adapter::enable_offload`]. Registers may be
    /// partially programmed; the previous flags are kept.
    pub fn reset(&mut self) -> TsnResult<()> {
        let new_flags = self.new_flags();

        if !new_flags.any_enabled() {
            self.disable_offload();
            self.counters.record(ResetKind::Disabled);
            return Ok(());
        }

        if let Err(e) = self.enable_offload() {
            self.counters.record(ResetKind::Failed);
            warn!(
                error = %e,
                requested = %new_flags,
                flags = %self.flags,
                "TSN enable failed, keeping previous flags"
            );
            return Err(e);
        }

        self.flags = new_flags;
        self.counters.record(ResetKind::Enabled);
        info!(variant = %self.variant, flags = %self.flags, "TSN offload enabled");
        Ok(())
    }
}
