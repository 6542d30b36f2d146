//! Lock manager integration tests.
//!
//! Exercises the manager, table and reaper together under real concurrency:
//! FIFO promotion, mutual exclusion, timeouts and lease expiry.

mod expiry;
mod fifo;
