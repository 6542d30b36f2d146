pub mod clock;
pub mod config;
mod lock;
mod reaper;
pub mod telemetry;

// HTTP gateway (requires "http" feature)
#[cfg(feature = "http")]
pub mod gateway;

pub use clock::{LeaseClock, ManualClock, MonotonicClock};
pub use lock::{
    AcquireOutcome, DeleteOutcome, Lock, LockError, LockHandle, LockId, LockInfo, LockManager,
    LockRequest, PendingAcquire, ReleaseOutcome, ResourceInfo, ResourceTable, WaitOutcome,
    WaiterInfo,
};
pub use reaper::{ExpiryReaper, ReaperStats};
