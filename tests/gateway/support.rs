//! Test server bootstrap.

use std::sync::Arc;
use std::time::Duration;

use rdlm::config::Limits;
use rdlm::{gateway, ExpiryReaper, LockManager, ResourceTable};

/// A running gateway. The reaper stops when this is dropped.
pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    _reaper: ExpiryReaper,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Bind to port 0 and return the running server.
pub async fn start_server() -> TestServer {
    start_server_with(Limits::default()).await
}

pub async fn start_server_with(limits: Limits) -> TestServer {
    let table = Arc::new(ResourceTable::new());
    let reaper = ExpiryReaper::spawn(table.clone(), Duration::from_millis(100));
    let app = gateway::router(LockManager::new(table), limits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        _reaper: reaper,
    }
}
