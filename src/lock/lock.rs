use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LockError;

/// Unique identifier of a granted lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(String);

impl LockId {
    /// A fresh random identifier (32 lowercase hex characters).
    pub fn generate() -> Self {
        LockId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockId {
    fn from(id: &str) -> Self {
        LockId(id.to_string())
    }
}

impl From<String> for LockId {
    fn from(id: String) -> Self {
        LockId(id)
    }
}

/// What a caller asks for when acquiring a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    /// Free-text description of the holder.
    pub title: String,
    /// How long the caller is willing to queue. Zero never blocks.
    pub wait: Duration,
    /// How long the lease lives once granted.
    pub lifetime: Duration,
}

impl LockRequest {
    pub fn new(title: impl Into<String>, wait: Duration, lifetime: Duration) -> Self {
        LockRequest {
            title: title.into(),
            wait,
            lifetime,
        }
    }

    /// Reject requests no lease can be built from: a zero lifetime, or a
    /// wait plus lifetime that runs past what the clock can represent
    /// from `now`.
    pub fn check(&self, now: Instant) -> Result<(), LockError> {
        if self.lifetime.is_zero() {
            return Err(LockError::InvalidRequest(
                "lifetime must be greater than zero".into(),
            ));
        }
        now.checked_add(self.wait)
            .and_then(|latest_grant| latest_grant.checked_add(self.lifetime))
            .map(|_| ())
            .ok_or_else(|| {
                LockError::InvalidRequest(format!(
                    "wait {:?} plus lifetime {:?} is out of range",
                    self.wait, self.lifetime
                ))
            })
    }
}

/// A granted lease on a resource.
///
/// Values handed out by the table are snapshots; dropping or cloning one has
/// no effect on the lease itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    resource: String,
    id: LockId,
    title: String,
    wait: Duration,
    lifetime: Duration,
    granted_at: Instant,
    expires_at: Instant,
}

impl Lock {
    pub(crate) fn grant(resource: &str, request: &LockRequest, now: Instant) -> Self {
        Lock {
            resource: resource.to_string(),
            id: LockId::generate(),
            title: request.title.clone(),
            wait: request.wait,
            lifetime: request.lifetime,
            granted_at: now,
            expires_at: now + request.lifetime,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn id(&self) -> &LockId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn granted_at(&self) -> Instant {
        self.granted_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// A lease is expired once `now` reaches its expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    pub fn handle(&self) -> LockHandle {
        LockHandle {
            resource: self.resource.clone(),
            id: self.id.clone(),
        }
    }

    pub fn info(&self, now: Instant) -> LockInfo {
        LockInfo {
            resource: self.resource.clone(),
            id: self.id.clone(),
            title: self.title.clone(),
            wait: self.wait,
            lifetime: self.lifetime,
            held_for: now.saturating_duration_since(self.granted_at),
            expires_in: self.expires_at.saturating_duration_since(now),
        }
    }
}

/// Address of a granted lock: the resource name plus the lock id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockHandle {
    pub resource: String,
    pub id: LockId,
}

impl LockHandle {
    /// Path under which the gateway exposes this lock. The resource name is
    /// encoded as a single path segment.
    pub fn address(&self) -> String {
        format!("/locks/{}/{}", urlencoding::encode(&self.resource), self.id)
    }
}

/// Read-only view of a held lock at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub resource: String,
    pub id: LockId,
    pub title: String,
    pub wait: Duration,
    pub lifetime: Duration,
    pub held_for: Duration,
    pub expires_in: Duration,
}

/// Read-only view of a queued acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaiterInfo {
    pub title: String,
    pub wait: Duration,
    pub lifetime: Duration,
    pub queued_for: Duration,
}

/// Read-only view of one resource: its holder (if any) and its wait queue in
/// promotion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub name: String,
    pub lock: Option<LockInfo>,
    pub waiters: Vec<WaiterInfo>,
}

impl ResourceInfo {
    pub(crate) fn empty(name: &str) -> Self {
        ResourceInfo {
            name: name.to_string(),
            lock: None,
            waiters: Vec::new(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }
}
