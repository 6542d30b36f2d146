//! Leases on named resources: the table that stores them and the manager
//! that hands them out.

mod error;
mod lock;
mod lock_manager;
mod outcome;
mod table;

pub use error::LockError;
pub use lock::{Lock, LockHandle, LockId, LockInfo, LockRequest, ResourceInfo, WaiterInfo};
pub use lock_manager::LockManager;
pub use outcome::{AcquireOutcome, DeleteOutcome, ReleaseOutcome, WaitOutcome};
pub use table::{PendingAcquire, ResourceTable};
