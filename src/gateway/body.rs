//! JSON request and response bodies.
//!
//! Responses follow a small subset of HAL: plain JSON objects with a
//! `_links.self.href` pointing back at the resource, served as
//! `application/hal+json`.

use std::time::Duration;

use axum::http::header::{self, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use crate::config::Limits;
use crate::lock::{LockInfo, LockRequest, ResourceInfo, WaiterInfo};

pub const HAL_JSON: &str = "application/hal+json";

/// Body of `POST /locks/{resource}`. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AcquireBody {
    pub title: String,
    /// Seconds to wait for the resource.
    pub wait: u64,
    /// Seconds the lease lives once granted.
    pub lifetime: u64,
}

impl AcquireBody {
    pub fn parse(bytes: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(bytes)
            .map_err(|e| GatewayError::BadRequest(format!("invalid lock request body: {e}")))
    }

    /// Check bounds and convert to a [`LockRequest`].
    pub fn into_request(self, limits: &Limits) -> Result<LockRequest, GatewayError> {
        let wait = Duration::from_secs(self.wait);
        let lifetime = Duration::from_secs(self.lifetime);
        if lifetime.is_zero() {
            return Err(GatewayError::BadRequest("lifetime must be at least 1".into()));
        }
        if lifetime > limits.max_lifetime {
            return Err(GatewayError::BadRequest(format!(
                "lifetime {} exceeds maximum {}",
                self.lifetime,
                limits.max_lifetime.as_secs()
            )));
        }
        if wait > limits.max_wait {
            return Err(GatewayError::BadRequest(format!(
                "wait {} exceeds maximum {}",
                self.wait,
                limits.max_wait.as_secs()
            )));
        }
        Ok(LockRequest::new(self.title, wait, lifetime))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub this: Link,
}

impl Links {
    fn to(href: String) -> Self {
        Links { this: Link { href } }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LockBody {
    pub uid: String,
    pub resource: String,
    pub title: String,
    pub wait: u64,
    pub lifetime: u64,
    pub held_for: f64,
    pub expires_in: f64,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<&LockInfo> for LockBody {
    fn from(info: &LockInfo) -> Self {
        LockBody {
            uid: info.id.to_string(),
            resource: info.resource.clone(),
            title: info.title.clone(),
            wait: info.wait.as_secs(),
            lifetime: info.lifetime.as_secs(),
            held_for: info.held_for.as_secs_f64(),
            expires_in: info.expires_in.as_secs_f64(),
            links: Links::to(format!(
                "/locks/{}/{}",
                urlencoding::encode(&info.resource),
                info.id
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WaiterBody {
    pub title: String,
    pub wait: u64,
    pub lifetime: u64,
    pub queued_for: f64,
}

impl From<&WaiterInfo> for WaiterBody {
    fn from(info: &WaiterInfo) -> Self {
        WaiterBody {
            title: info.title.clone(),
            wait: info.wait.as_secs(),
            lifetime: info.lifetime.as_secs(),
            queued_for: info.queued_for.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceBody {
    pub name: String,
    pub locked: bool,
    pub waiting: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockBody>,
    pub waiters: Vec<WaiterBody>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<&ResourceInfo> for ResourceBody {
    fn from(info: &ResourceInfo) -> Self {
        ResourceBody {
            name: info.name.clone(),
            locked: info.is_locked(),
            waiting: info.waiters.len(),
            lock: info.lock.as_ref().map(LockBody::from),
            waiters: info.waiters.iter().map(WaiterBody::from).collect(),
            links: Links::to(format!("/resources/{}", urlencoding::encode(&info.name))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceListBody {
    pub resources: Vec<ResourceBody>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<&[ResourceInfo]> for ResourceListBody {
    fn from(infos: &[ResourceInfo]) -> Self {
        ResourceListBody {
            resources: infos.iter().map(ResourceBody::from).collect(),
            links: Links::to("/resources".to_string()),
        }
    }
}

/// Serialize `T` as `application/hal+json`.
pub struct Hal<T>(pub T);

impl<T: Serialize> IntoResponse for Hal<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(HAL_JSON))],
                bytes,
            )
                .into_response(),
            Err(e) => GatewayError::Internal(e.to_string()).into_response(),
        }
    }
}
