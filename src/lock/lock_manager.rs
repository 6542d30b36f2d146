use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::table::{PendingAcquire, ResourceTable};
use super::{
    AcquireOutcome, DeleteOutcome, LockError, LockId, LockInfo, LockRequest, ReleaseOutcome,
    ResourceInfo,
};

/// The lock service facade.
///
/// Cloning a `LockManager` yields another handle onto the same
/// [`ResourceTable`]; the table is injected at construction so that the
/// [`ExpiryReaper`](crate::ExpiryReaper) can share it.
#[derive(Clone)]
pub struct LockManager {
    table: Arc<ResourceTable>,
}

impl LockManager {
    pub fn new(table: Arc<ResourceTable>) -> Self {
        LockManager { table }
    }

    pub fn table(&self) -> &Arc<ResourceTable> {
        &self.table
    }

    pub fn now(&self) -> Instant {
        self.table.now()
    }

    /// Acquire `resource`, queueing for up to `request.wait` if it is held.
    ///
    /// A free resource is granted without suspending. With a zero wait a held
    /// resource yields [`AcquireOutcome::WouldBlock`]. Otherwise the caller
    /// suspends until it is promoted, its wait runs out, or the resource is
    /// removed. If promotion and the deadline coincide, the grant wins.
    pub async fn acquire(
        &self,
        resource: &str,
        request: LockRequest,
    ) -> Result<AcquireOutcome, LockError> {
        request.check(self.now())?;

        if let Some(lock) = self.table.try_grant(resource, &request)? {
            info!(resource, lock_id = %lock.id(), title = lock.title(), "lock granted");
            return Ok(AcquireOutcome::Granted(lock));
        }

        if request.wait.is_zero() {
            debug!(resource, "resource held, caller does not wait");
            return Ok(AcquireOutcome::WouldBlock);
        }

        let wait = request.wait;
        let (signal, mut resolved) = oneshot::channel();
        let pending = PendingAcquire::new(request, signal, self.table.now());
        let ticket = self.table.enqueue(resource, pending)?;
        debug!(resource, ticket, wait_ms = wait.as_millis() as u64, "queued for lock");

        let outcome = match tokio::time::timeout(wait, &mut resolved).await {
            Ok(Ok(outcome)) => outcome.into(),
            // The table never drops a signal unresolved while it is alive.
            Ok(Err(_)) => AcquireOutcome::Cancelled,
            Err(_) => {
                if self.table.cancel(resource, ticket)? {
                    AcquireOutcome::TimedOut
                } else {
                    // Resolved right at the deadline; that resolution stands.
                    resolved
                        .try_recv()
                        .map(AcquireOutcome::from)
                        .unwrap_or(AcquireOutcome::TimedOut)
                }
            }
        };

        match &outcome {
            AcquireOutcome::Granted(lock) => {
                info!(
                    resource,
                    ticket,
                    lock_id = %lock.id(),
                    title = lock.title(),
                    "lock granted after wait"
                )
            }
            AcquireOutcome::TimedOut => info!(resource, ticket, "lock wait timed out"),
            AcquireOutcome::Cancelled => {
                warn!(resource, ticket, "lock wait cancelled, resource removed")
            }
            AcquireOutcome::WouldBlock => {}
        }
        Ok(outcome)
    }

    /// Release a lock. Unknown or already-expired locks report `NotFound`.
    pub fn release(&self, resource: &str, id: &LockId) -> Result<ReleaseOutcome, LockError> {
        if self.table.release(resource, id)? {
            info!(resource, lock_id = %id, "lock released");
            Ok(ReleaseOutcome::Released)
        } else {
            debug!(resource, lock_id = %id, "release of unknown lock ignored");
            Ok(ReleaseOutcome::NotFound)
        }
    }

    /// Snapshot of a lock, only while it is the live holder of `resource`.
    pub fn get(&self, resource: &str, id: &LockId) -> Result<Option<LockInfo>, LockError> {
        let now = self.table.now();
        Ok(self.table.holder(resource, id)?.map(|lock| lock.info(now)))
    }

    pub fn resource(&self, resource: &str) -> Result<ResourceInfo, LockError> {
        self.table.resource(resource)
    }

    pub fn resources(&self) -> Result<Vec<ResourceInfo>, LockError> {
        self.table.resources()
    }

    pub fn delete_resource(&self, resource: &str) -> Result<DeleteOutcome, LockError> {
        let outcome = self.table.remove_resource(resource)?;
        match &outcome {
            DeleteOutcome::Deleted => info!(resource, "resource deleted"),
            DeleteOutcome::Conflict(_) => debug!(resource, "resource delete refused, lock held"),
        }
        Ok(outcome)
    }

    pub fn delete_all(&self) -> Result<DeleteOutcome, LockError> {
        let outcome = self.table.remove_all()?;
        match &outcome {
            DeleteOutcome::Deleted => info!("all resources deleted"),
            DeleteOutcome::Conflict(held) => {
                debug!(held = held.len(), "delete of all resources refused, locks held")
            }
        }
        Ok(outcome)
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(Arc::new(ResourceTable::new()))
    }
}
