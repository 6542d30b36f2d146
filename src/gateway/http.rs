//! HTTP transport for the lock manager. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /locks/:resource`: acquire. Body `{ title, wait, lifetime }`.
//!   201 with `Location`, 408 on timeout, 400 on a bad body.
//! - `GET /locks/:resource/:lock_id`: 200 while the lock is held, else 404.
//! - `DELETE /locks/:resource/:lock_id`: release, always 204.
//! - `GET /resources`: every resource with its holder and queue.
//! - `DELETE /resources`: 204, or 409 while any lock is held.
//! - `GET /resources/:resource`: always 200, empty if unknown.
//! - `DELETE /resources/:resource`: 204, or 409 while its lock is held.
//! - `GET /health`: `{ "ok": true, "resources": n }`.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::body::{AcquireBody, Hal, LockBody, ResourceBody, ResourceListBody};
use super::error::GatewayError;
use crate::config::Limits;
use crate::lock::{AcquireOutcome, DeleteOutcome, LockId, LockManager};

#[derive(Clone)]
struct GatewayState {
    manager: LockManager,
    limits: Limits,
}

/// Build an axum `Router` serving the lock API over `manager`.
pub fn router(manager: LockManager, limits: Limits) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/locks/:resource", post(acquire_handler))
        .route(
            "/locks/:resource/:lock_id",
            get(get_lock_handler).delete(release_handler),
        )
        .route(
            "/resources",
            get(list_resources_handler).delete(delete_all_handler),
        )
        .route(
            "/resources/:resource",
            get(get_resource_handler).delete(delete_resource_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(GatewayState { manager, limits })
}

/// Serve the lock API at the given address (e.g. `"0.0.0.0:8888"`).
pub async fn serve(manager: LockManager, limits: Limits, addr: &str) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(manager, limits)).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    manager: LockManager,
    limits: Limits,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(manager, limits))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_handler(State(state): State<GatewayState>) -> Result<Response, GatewayError> {
    let resources = state.manager.table().len()?;
    Ok(Json(json!({ "ok": true, "resources": resources })).into_response())
}

/// `POST /locks/:resource`
///
/// The body is read raw so that any decoding failure maps to 400, which
/// axum's `Json` extractor would not guarantee.
async fn acquire_handler(
    State(state): State<GatewayState>,
    Path(resource): Path<String>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let request = AcquireBody::parse(&body)?.into_request(&state.limits)?;
    match state.manager.acquire(&resource, request).await? {
        AcquireOutcome::Granted(lock) => {
            let body = LockBody::from(&lock.info(state.manager.now()));
            Ok((
                StatusCode::CREATED,
                [(header::LOCATION, lock.handle().address())],
                Hal(body),
            )
                .into_response())
        }
        AcquireOutcome::WouldBlock | AcquireOutcome::TimedOut => {
            Err(GatewayError::Timeout(resource))
        }
        AcquireOutcome::Cancelled => Err(GatewayError::Conflict {
            message: format!("resource {resource} was deleted while waiting"),
            held: Vec::new(),
        }),
    }
}

/// `GET /locks/:resource/:lock_id`
async fn get_lock_handler(
    State(state): State<GatewayState>,
    Path((resource, lock_id)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    match state.manager.get(&resource, &LockId::from(lock_id))? {
        Some(info) => Ok(Hal(LockBody::from(&info)).into_response()),
        None => Err(GatewayError::NotFound(format!("lock on {resource}"))),
    }
}

/// `DELETE /locks/:resource/:lock_id`: idempotent.
async fn release_handler(
    State(state): State<GatewayState>,
    Path((resource, lock_id)): Path<(String, String)>,
) -> Result<StatusCode, GatewayError> {
    state.manager.release(&resource, &LockId::from(lock_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /resources`
async fn list_resources_handler(
    State(state): State<GatewayState>,
) -> Result<Response, GatewayError> {
    let resources = state.manager.resources()?;
    Ok(Hal(ResourceListBody::from(resources.as_slice())).into_response())
}

/// `GET /resources/:resource`
///
/// Unknown and empty resources look the same here: both answer 200 with an
/// unlocked, empty body.
async fn get_resource_handler(
    State(state): State<GatewayState>,
    Path(resource): Path<String>,
) -> Result<Response, GatewayError> {
    let info = state.manager.resource(&resource)?;
    Ok(Hal(ResourceBody::from(&info)).into_response())
}

/// `DELETE /resources/:resource`
async fn delete_resource_handler(
    State(state): State<GatewayState>,
    Path(resource): Path<String>,
) -> Result<StatusCode, GatewayError> {
    deleted(state.manager.delete_resource(&resource)?)
}

/// `DELETE /resources`
async fn delete_all_handler(State(state): State<GatewayState>) -> Result<StatusCode, GatewayError> {
    deleted(state.manager.delete_all()?)
}

fn deleted(outcome: DeleteOutcome) -> Result<StatusCode, GatewayError> {
    match outcome {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Conflict(held) => Err(GatewayError::Conflict {
            message: format!("{} resource(s) still locked", held.len()),
            held,
        }),
    }
}
