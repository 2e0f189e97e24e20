//! Apply dispatcher and deferred reset worker.
//!
//! Configuration changes end in [`TsnOffload::apply`]. Most resets run
//! synchronously under the adapter lock. On an i225 whose interface is
//! running, register reprogramming must not race live traffic, so the reset
//! is handed to a single background worker instead:
//!
//! - At most one deferred reset is queued at a time; further dispatches are
//!   merged into it (counted as coalesced).
//! - A dispatch that arrives while the worker is running queues exactly one
//!   follow-up, so the latest configuration is always applied.
//! - The worker re-reads the adapter when it runs, not when it was queued.

use crate::access::RegisterAccess;
use crate::adapter::Adapter;
use crossbeam::channel::{self, Sender, TrySendError};
use serde::Serialize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};
use tsn_common::{DispatchCounters, TsnError, TsnResult, TsnStats};

/// Adapter shared between the dispatcher and the reset worker.
pub type SharedAdapter<R> = Arc<Mutex<Adapter<R>>>;

/// How a dispatched reset was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    /// The reset ran on the calling thread.
    Applied,
    /// The reset was handed to the worker (or merged into a pending one).
    Deferred,
}

fn lock<R>(adapter: &Mutex<Adapter<R>>) -> MutexGuard<'_, Adapter<R>> {
    // A panic mid-reset leaves registers no worse than a failed enable.
    adapter.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bookkeeping shared with the worker thread.
#[derive(Debug, Default)]
struct WorkerState {
    /// Resets queued or running.
    outstanding: Mutex<usize>,
    /// Signalled when `outstanding` drops to zero.
    idle: Condvar,
}

impl WorkerState {
    fn outstanding(&self) -> MutexGuard<'_, usize> {
        self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        *self.outstanding() += 1;
    }

    fn finish(&self) {
        let mut outstanding = self.outstanding();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }
}

/// Single-concurrency background worker running deferred resets.
#[derive(Debug)]
pub struct ResetWorker {
    /// Queue of pending resets; capacity one.
    sender: Option<Sender<()>>,
    /// Worker thread handle.
    handle: Option<JoinHandle<()>>,
    state: Arc<WorkerState>,
    counters: Arc<DispatchCounters>,
}

impl ResetWorker {
    /// Start the worker thread for `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Worker`] if the thread cannot be spawned.
    pub fn spawn<R>(adapter: SharedAdapter<R>, counters: Arc<DispatchCounters>) -> TsnResult<Self>
    where
        R: RegisterAccess + 'static,
    {
        let (sender, receiver) = channel::bounded::<()>(1);
        let state = Arc::new(WorkerState::default());
        let worker_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("tsn-reset".into())
            .spawn(move || {
                debug!("Reset worker started");

                for () in receiver.iter() {
                    {
                        let mut adapter = lock(&adapter);
                        if let Err(e) = adapter.reset() {
                            error!(error = %e, "Deferred TSN reset failed");
                        }
                    }
                    worker_state.finish();
                }

                debug!("Reset worker stopped");
            })
            .map_err(|e| TsnError::Worker(format!("failed to spawn reset worker: {e}")))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            state,
            counters,
        })
    }

    /// Queue a reset.
    ///
    /// Returns `true` if a new reset was queued and `false` if it was merged
    /// into one already pending.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Worker`] if the worker has been shut down.
    pub fn schedule(&self) -> TsnResult<bool> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TsnError::Worker("reset worker has been shut down".into()))?;

        // Count before sending so the worker can never finish it first.
        self.state.begin();
        match sender.try_send(()) {
            Ok(()) => {
                self.counters.record_deferred();
                Ok(true)
            }
            Err(TrySendError::Full(())) => {
                self.state.finish();
                self.counters.record_coalesced();
                Ok(false)
            }
            Err(TrySendError::Disconnected(())) => {
                self.state.finish();
                Err(TsnError::Worker("reset worker has exited".into()))
            }
        }
    }

    /// Wait until no reset is queued or running.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let outstanding = self.state.outstanding();
        let (outstanding, _) = self
            .state
            .idle
            .wait_timeout_while(outstanding, timeout, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *outstanding == 0
    }

    /// Stop accepting resets, let the pending one finish, and join the thread.
    pub fn shutdown(&mut self) {
        // Dropping the sender ends the worker loop once the queue drains
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Reset worker panicked");
            }
        }
    }

    /// Whether the worker still accepts resets.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }
}

impl Drop for ResetWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// TSN offload engine for one adapter: shared state plus reset dispatch.
#[derive(Debug)]
pub struct TsnOffload<R> {
    adapter: SharedAdapter<R>,
    worker: ResetWorker,
    counters: Arc<DispatchCounters>,
}

impl<R: RegisterAccess + 'static> TsnOffload<R> {
    /// Take ownership of `adapter` and start its reset worker.
    ///
    /// # Errors
    ///
    /// Returns [`TsnError::Worker`] if the worker thread cannot be spawned.
    pub fn new(adapter: Adapter<R>) -> TsnResult<Self> {
        let variant = adapter.variant();
        let adapter = Arc::new(Mutex::new(adapter));
        let counters = Arc::new(DispatchCounters::new());
        let worker = ResetWorker::spawn(Arc::clone(&adapter), Arc::clone(&counters))?;

        info!(%variant, "TSN offload engine started");
        Ok(Self {
            adapter,
            worker,
            counters,
        })
    }

    /// Shared adapter handle.
    pub fn adapter(&self) -> &SharedAdapter<R> {
        &self.adapter
    }

    /// Run `f` with exclusive access to the adapter.
    ///
    /// Used by the configuration layer to update queue and schedule
    /// settings before calling [`TsnOffload::apply`].
    pub fn with_adapter<T>(&self, f: impl FnOnce(&mut Adapter<R>) -> T) -> T {
        f(&mut lock(&self.adapter))
    }

    /// Apply the current configuration to hardware.
    ///
    /// Never fails: a synchronous failure is logged and counted, and a
    /// deferred one is reported by the worker the same way. Use
    /// [`TsnOffload::reset`] to observe the error directly.
    pub fn apply(&self) -> ApplyOutcome {
        let defer = {
            let adapter = lock(&self.adapter);
            adapter.netdev_running() && adapter.variant().requires_quiescent_reset()
        };

        if defer {
            match self.worker.schedule() {
                Ok(queued) => {
                    debug!(queued, "TSN reset deferred to worker");
                    return ApplyOutcome::Deferred;
                }
                Err(e) => {
                    error!(error = %e, "Cannot defer TSN reset, applying synchronously");
                }
            }
        }

        if let Err(e) = lock(&self.adapter).reset() {
            error!(error = %e, "TSN reset failed");
        }
        ApplyOutcome::Applied
    }

    /// Run a reset synchronously, regardless of link state.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Adapter::reset`].
    pub fn reset(&self) -> TsnResult<()> {
        lock(&self.adapter).reset()
    }

    /// Snapshot of flags and counters.
    pub fn stats(&self) -> TsnStats {
        let adapter = lock(&self.adapter);
        TsnStats::new(adapter.flags(), adapter.counters(), &self.counters)
    }

    /// Wait for deferred resets to drain. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.worker.wait_idle(timeout)
    }

    /// Stop the reset worker. Later deferred dispatches run synchronously.
    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}
