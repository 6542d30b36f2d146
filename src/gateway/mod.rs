//! gateway: the HTTP surface of the lock service.
//!
//! Requires the `http` feature. Request bodies are validated here, before
//! the [`LockManager`](crate::LockManager) is called, and this is the only
//! place lock outcomes are turned into status codes.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rdlm::{config::Limits, gateway, LockManager, ResourceTable};
//!
//! let manager = LockManager::new(Arc::new(ResourceTable::new()));
//!
//! // Compose with other axum routes
//! let app = gateway::router(manager.clone(), Limits::default());
//!
//! // Or serve directly
//! gateway::serve(manager, Limits::default(), "127.0.0.1:8888").await?;
//! ```

mod body;
mod error;
mod http;

pub use body::{
    AcquireBody, Link, Links, LockBody, ResourceBody, ResourceListBody, WaiterBody, HAL_JSON,
};
pub use error::GatewayError;
pub use http::{router, serve, serve_with_shutdown};
