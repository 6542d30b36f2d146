use super::Lock;

/// Result of [`LockManager::acquire`](super::LockManager::acquire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The lease was granted, either immediately or after queueing.
    Granted(Lock),
    /// The resource was held and the caller asked not to wait.
    WouldBlock,
    /// The wait elapsed before the resource became free.
    TimedOut,
    /// The resource was removed while the caller was queued.
    Cancelled,
}

impl AcquireOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AcquireOutcome::Granted(_))
    }

    /// The granted lock, if any.
    pub fn granted(self) -> Option<Lock> {
        match self {
            AcquireOutcome::Granted(lock) => Some(lock),
            _ => None,
        }
    }
}

/// Result of releasing a lock. Releasing an unknown lock is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotFound,
}

/// Result of deleting one resource or the whole table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Resources still holding a live lock, sorted by name.
    Conflict(Vec<String>),
}

/// How a queued acquire was resolved by the table.
///
/// Sent exactly once through the waiter's completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Granted(Lock),
    Cancelled,
}

impl From<WaitOutcome> for AcquireOutcome {
    fn from(outcome: WaitOutcome) -> Self {
        match outcome {
            WaitOutcome::Granted(lock) => AcquireOutcome::Granted(lock),
            WaitOutcome::Cancelled => AcquireOutcome::Cancelled,
        }
    }
}
