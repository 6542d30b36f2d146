use thiserror::Error;

/// Error type for lock table operations.
///
/// Contention outcomes (timeouts, unknown locks, delete conflicts) are not
/// errors; they are reported through the outcome enums instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The resource table mutex was poisoned (a thread panicked while holding it).
    #[error("resource table lock poisoned during {0}")]
    Poisoned(&'static str),
    /// The request can never be satisfied as given.
    #[error("invalid lock request: {0}")]
    InvalidRequest(String),
}
