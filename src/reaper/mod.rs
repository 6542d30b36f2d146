//! Expiry reaper: reclaims leases whose lifetime has elapsed.
//!
//! Every table operation already evicts an expired holder of the resource it
//! touches, so correctness never waits on the reaper. What the reaper adds is
//! liveness: a waiter queued behind a lease that nobody touches again is
//! promoted within one sweep interval of the lease expiring.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rdlm::{ExpiryReaper, LockManager, ResourceTable};
//!
//! let table = Arc::new(ResourceTable::new());
//! let reaper = ExpiryReaper::spawn(table.clone(), Duration::from_secs(1));
//! let manager = LockManager::new(table);
//!
//! // ... serve requests ...
//!
//! let stats = reaper.stop();
//! println!("expired {} leases", stats.locks_expired);
//! ```

mod thread;

pub use thread::{ExpiryReaper, ReaperStats};
