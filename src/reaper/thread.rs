//! Background thread that sweeps the resource table for expired leases.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::lock::ResourceTable;

/// Statistics from the expiry reaper.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReaperStats {
    /// Number of sweeps completed.
    pub sweeps: usize,
    /// Number of leases evicted because their lifetime elapsed.
    pub locks_expired: usize,
    /// Number of sweeps that could not read the table.
    pub failed_sweeps: usize,
}

/// A background thread that calls [`ResourceTable::expire_due`] at a fixed
/// cadence.
///
/// Spawn it, let it run, stop it to collect stats. Dropping the handle
/// signals the thread to stop without waiting for it.
pub struct ExpiryReaper {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<ReaperStats>>,
}

impl ExpiryReaper {
    /// Spawn a reaper sweeping `table` every `interval`.
    pub fn spawn(table: Arc<ResourceTable>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = ReaperStats::default();
            debug!(interval_ms = interval.as_millis() as u64, "expiry reaper started");

            loop {
                // Sleep one interval, waking early on stop
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                stats.sweeps += 1;

                match table.expire_due(table.now()) {
                    Ok(expired) => stats.locks_expired += expired.len(),
                    Err(e) => {
                        warn!(error = %e, "expiry sweep failed");
                        stats.failed_sweeps += 1;
                    }
                }
            }

            debug!(
                sweeps = stats.sweeps,
                expired = stats.locks_expired,
                "expiry reaper stopped"
            );
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the reaper to stop and wait for it to finish.
    /// Returns the reaper statistics.
    pub fn stop(mut self) -> ReaperStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            ReaperStats::default()
        }
    }

    /// Signal the reaper to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for ExpiryReaper {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
