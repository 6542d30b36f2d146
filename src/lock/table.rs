use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::{
    DeleteOutcome, Lock, LockError, LockId, LockRequest, ResourceInfo, WaitOutcome, WaiterInfo,
};
use crate::clock::{LeaseClock, MonotonicClock};

/// A blocked acquire call, queued behind the current holder of a resource.
///
/// The caller keeps the receiving half of `signal`; the table resolves the
/// entry exactly once, by granting it or cancelling it. An entry whose
/// receiver is gone is skipped at promotion time.
#[derive(Debug)]
pub struct PendingAcquire {
    ticket: u64,
    request: LockRequest,
    arrived_at: Instant,
    signal: oneshot::Sender<WaitOutcome>,
}

impl PendingAcquire {
    pub fn new(
        request: LockRequest,
        signal: oneshot::Sender<WaitOutcome>,
        arrived_at: Instant,
    ) -> Self {
        PendingAcquire {
            ticket: 0,
            request,
            arrived_at,
            signal,
        }
    }

    /// Queue ticket assigned by [`ResourceTable::enqueue`]; zero before that.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn request(&self) -> &LockRequest {
        &self.request
    }

    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }

    fn info(&self, now: Instant) -> WaiterInfo {
        WaiterInfo {
            title: self.request.title.clone(),
            wait: self.request.wait,
            lifetime: self.request.lifetime,
            queued_for: now.saturating_duration_since(self.arrived_at),
        }
    }
}

/// One named resource: at most one holder plus a FIFO queue.
///
/// Invariant: when there is no holder the queue is empty; every transition
/// that clears the holder promotes immediately.
#[derive(Debug, Default)]
struct Resource {
    holder: Option<Lock>,
    waiters: VecDeque<PendingAcquire>,
}

impl Resource {
    fn is_idle(&self) -> bool {
        self.holder.is_none() && self.waiters.is_empty()
    }

    fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    /// Evict the holder if its lease has run out, promoting the next waiter.
    fn settle(&mut self, name: &str, now: Instant) -> Option<Lock> {
        if !self.holder.as_ref().is_some_and(|lock| lock.is_expired(now)) {
            return None;
        }
        let expired = self.holder.take();
        self.promote(name, now);
        expired
    }

    /// Hand the resource to the first waiter still listening.
    fn promote(&mut self, name: &str, now: Instant) {
        while let Some(pending) = self.waiters.pop_front() {
            let lock = Lock::grant(name, &pending.request, now);
            match pending.signal.send(WaitOutcome::Granted(lock.clone())) {
                Ok(()) => {
                    debug!(
                        resource = name,
                        ticket = pending.ticket,
                        lock_id = %lock.id(),
                        "waiter promoted"
                    );
                    self.holder = Some(lock);
                    return;
                }
                Err(_) => {
                    debug!(resource = name, ticket = pending.ticket, "skipping abandoned waiter");
                }
            }
        }
    }

    // Never finds waiters in practice: a queue is only non-empty behind a
    // holder, and held resources are not removed.
    fn cancel_waiters(&mut self, name: &str) {
        for pending in self.waiters.drain(..) {
            debug!(resource = name, ticket = pending.ticket, "waiter cancelled, resource removed");
            let _ = pending.signal.send(WaitOutcome::Cancelled);
        }
    }

    fn info(&self, name: &str, now: Instant) -> ResourceInfo {
        ResourceInfo {
            name: name.to_string(),
            lock: self.holder.as_ref().map(|lock| lock.info(now)),
            waiters: self.waiters.iter().map(|pending| pending.info(now)).collect(),
        }
    }
}

/// Process-wide mapping from resource name to holder and wait queue.
///
/// Every operation runs under one mutex and never blocks while holding it,
/// so each call is atomic with respect to every other call. Callers that
/// need to wait do so outside the table, on the signal of their
/// [`PendingAcquire`].
pub struct ResourceTable {
    clock: Arc<dyn LeaseClock>,
    resources: Mutex<HashMap<String, Resource>>,
    next_ticket: AtomicU64,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    pub fn with_clock(clock: Arc<dyn LeaseClock>) -> Self {
        ResourceTable {
            clock,
            resources: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Current instant according to the table's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    fn guard(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, HashMap<String, Resource>>, LockError> {
        self.resources
            .lock()
            .map_err(|_| LockError::Poisoned(operation))
    }

    /// Return the resource, creating an empty entry if it does not exist.
    pub fn get_or_create(&self, name: &str) -> Result<ResourceInfo, LockError> {
        let now = self.now();
        let mut resources = self.guard("get_or_create")?;
        let resource = resources.entry(name.to_string()).or_default();
        resource.settle(name, now);
        Ok(resource.info(name, now))
    }

    /// Grant a lock if the resource is free; `None` means it is held.
    pub fn try_grant(&self, name: &str, request: &LockRequest) -> Result<Option<Lock>, LockError> {
        let now = self.now();
        request.check(now)?;
        let mut resources = self.guard("try_grant")?;
        let resource = resources.entry(name.to_string()).or_default();
        resource.settle(name, now);
        if resource.is_held() {
            return Ok(None);
        }
        let lock = Lock::grant(name, request, now);
        resource.holder = Some(lock.clone());
        Ok(Some(lock))
    }

    /// Append a waiter to the resource's queue and return its ticket.
    ///
    /// If the resource turns out to be free (the holder left between a
    /// failed [`try_grant`](Self::try_grant) and this call) the waiter is
    /// promoted on the spot.
    pub fn enqueue(&self, name: &str, mut pending: PendingAcquire) -> Result<u64, LockError> {
        let now = self.now();
        pending.request.check(now)?;
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        pending.ticket = ticket;

        let mut resources = self.guard("enqueue")?;
        let resource = resources.entry(name.to_string()).or_default();
        resource.settle(name, now);
        resource.waiters.push_back(pending);
        if !resource.is_held() {
            resource.promote(name, now);
        }
        if resource.is_idle() {
            resources.remove(name);
        }
        Ok(ticket)
    }

    /// Remove a still-queued waiter. `false` means it was already resolved.
    pub fn cancel(&self, name: &str, ticket: u64) -> Result<bool, LockError> {
        let mut resources = self.guard("cancel")?;
        let Some(resource) = resources.get_mut(name) else {
            return Ok(false);
        };
        match resource.waiters.iter().position(|pending| pending.ticket == ticket) {
            Some(index) => {
                resource.waiters.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release `id` if it is the current holder, promoting the next waiter.
    ///
    /// Returns `false` when `id` is not the holder (already released or
    /// expired); that is a no-op, not an error.
    pub fn release(&self, name: &str, id: &LockId) -> Result<bool, LockError> {
        let now = self.now();
        let mut resources = self.guard("release")?;
        let Some(resource) = settled(&mut resources, name, now) else {
            return Ok(false);
        };
        if resource.holder.as_ref().map(Lock::id) != Some(id) {
            return Ok(false);
        }
        resource.holder = None;
        resource.promote(name, now);
        if resource.is_idle() {
            resources.remove(name);
        }
        Ok(true)
    }

    /// Snapshot of the holder of `name`, if its id is `id` and it is live.
    pub fn holder(&self, name: &str, id: &LockId) -> Result<Option<Lock>, LockError> {
        let now = self.now();
        let mut resources = self.guard("holder")?;
        Ok(settled(&mut resources, name, now)
            .and_then(|resource| resource.holder.as_ref())
            .filter(|lock| lock.id() == id)
            .cloned())
    }

    /// Evict every lease expired at `now`, promote waiters and drop idle
    /// resources. Returns the evicted locks.
    pub fn expire_due(&self, now: Instant) -> Result<Vec<Lock>, LockError> {
        let mut resources = self.guard("expire_due")?;
        let mut expired = Vec::new();
        for (name, resource) in resources.iter_mut() {
            if let Some(lock) = resource.settle(name, now) {
                info!(
                    resource = %name,
                    lock_id = %lock.id(),
                    title = lock.title(),
                    "lease expired"
                );
                expired.push(lock);
            }
        }
        resources.retain(|_, resource| !resource.is_idle());
        Ok(expired)
    }

    /// Delete one resource. Refused while a live lock is held; queued
    /// waiters (if any) are cancelled.
    pub fn remove_resource(&self, name: &str) -> Result<DeleteOutcome, LockError> {
        let now = self.now();
        let mut resources = self.guard("remove_resource")?;
        let Some(resource) = resources.get_mut(name) else {
            return Ok(DeleteOutcome::Deleted);
        };
        resource.settle(name, now);
        if resource.is_held() {
            return Ok(DeleteOutcome::Conflict(vec![name.to_string()]));
        }
        resource.cancel_waiters(name);
        resources.remove(name);
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete every resource, or none of them if any still holds a live lock.
    pub fn remove_all(&self) -> Result<DeleteOutcome, LockError> {
        let now = self.now();
        let mut resources = self.guard("remove_all")?;
        let mut held = Vec::new();
        for (name, resource) in resources.iter_mut() {
            resource.settle(name, now);
            if resource.is_held() {
                held.push(name.clone());
            }
        }
        if !held.is_empty() {
            held.sort();
            return Ok(DeleteOutcome::Conflict(held));
        }
        for (name, mut resource) in resources.drain() {
            resource.cancel_waiters(&name);
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Snapshot of one resource. Unknown resources yield an empty snapshot
    /// and are not created.
    pub fn resource(&self, name: &str) -> Result<ResourceInfo, LockError> {
        let now = self.now();
        let mut resources = self.guard("resource")?;
        Ok(settled(&mut resources, name, now)
            .map(|resource| resource.info(name, now))
            .unwrap_or_else(|| ResourceInfo::empty(name)))
    }

    /// Snapshot of every resource, sorted by name.
    pub fn resources(&self) -> Result<Vec<ResourceInfo>, LockError> {
        let now = self.now();
        let mut resources = self.guard("resources")?;
        let mut infos: Vec<ResourceInfo> = resources
            .iter_mut()
            .map(|(name, resource)| {
                resource.settle(name, now);
                resource.info(name, now)
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Number of resources currently in the table.
    pub fn len(&self) -> Result<usize, LockError> {
        Ok(self.guard("len")?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LockError> {
        Ok(self.len()? == 0)
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Settle `name` and drop it if that left it idle.
fn settled<'a>(
    resources: &'a mut HashMap<String, Resource>,
    name: &str,
    now: Instant,
) -> Option<&'a mut Resource> {
    let idle = {
        let resource = resources.get_mut(name)?;
        resource.settle(name, now);
        resource.is_idle()
    };
    if idle {
        resources.remove(name);
        return None;
    }
    resources.get_mut(name)
}
