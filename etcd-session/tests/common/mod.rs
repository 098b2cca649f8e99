//! In-process mock of the `/v1` HTTP surface.
//!
//! Each [`MockServer`] runs axum on its own single-threaded Tokio runtime in
//! a background thread, so tests can drive the blocking client from the
//! test thread. Servers built from the same [`MockCluster`] share a store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use etcd_session::ServerAddress;
use serde_json::json;
use tokio::sync::oneshot;
use url::form_urlencoded;

#[derive(Debug, Clone)]
pub struct Entry {
    pub value: String,
    pub ttl: Option<u32>,
}

#[derive(Default)]
struct Store {
    entries: HashMap<String, Entry>,
    index: u64,
}

/// How a mock server answers.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Behaves like a healthy member.
    Normal,
    /// Answers everything with an HTML error page.
    Garbage,
    /// Redirects every request to the given base URL, keeping the path.
    Redirect(String),
}

#[derive(Clone)]
struct MockState {
    store: Arc<Mutex<Store>>,
    hits: Arc<AtomicUsize>,
    leader: String,
    mode: Mode,
}

/// Servers sharing one key-value store.
#[derive(Clone)]
pub struct MockCluster {
    store: Arc<Mutex<Store>>,
    leader: String,
}

impl MockCluster {
    pub fn new(leader: &str) -> Self {
        Self {
            store: Arc::default(),
            leader: leader.to_string(),
        }
    }

    pub fn spawn(&self, mode: Mode) -> Result<MockServer> {
        MockServer::spawn(MockState {
            store: self.store.clone(),
            hits: Arc::default(),
            leader: self.leader.clone(),
            mode,
        })
    }

    pub fn insert(&self, key: &str, value: &str) {
        let mut store = self.store.lock().unwrap();
        store.index += 1;
        store.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                ttl: None,
            },
        );
    }

    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.store.lock().unwrap().entries.get(key).cloned()
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockServer {
    fn spawn(state: MockState) -> Result<Self> {
        let hits = state.hits.clone();
        let app = Router::new()
            .route("/v1/keys/*key", get(get_key).post(set_key).delete(delete_key))
            .route("/v1/leader", get(leader))
            .with_state(state);

        let (addr_tx, addr_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock server");
                let _ = addr_tx.send(listener.local_addr().expect("mock address"));

                // Idle keep-alive connections would stall a graceful shutdown,
                // so the server future is simply dropped.
                tokio::select! {
                    _ = axum::serve(listener, app).into_future() => {}
                    _ = shutdown_rx => {}
                }
            });
        });

        let addr = addr_rx.recv().context("mock server failed to start")?;
        Ok(Self {
            addr,
            hits,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn address(&self) -> ServerAddress {
        ServerAddress::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests this server has handled.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// An address nobody listens on.
pub fn dead_server() -> Result<ServerAddress> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(ServerAddress::new("127.0.0.1", port))
}

async fn get_key(State(state): State<MockState>, Path(key): Path<String>) -> Response {
    if let Some(response) = intercept(&state, &format!("/v1/keys/{key}")) {
        return response;
    }
    let store = state.store.lock().unwrap();
    match store.entries.get(&key) {
        Some(entry) => Json(json!({
            "action": "GET",
            "key": format!("/{key}"),
            "value": entry.value,
            "index": store.index,
        }))
        .into_response(),
        None => key_not_found(&key),
    }
}

async fn set_key(
    State(state): State<MockState>,
    Path(key): Path<String>,
    body: String,
) -> Response {
    if let Some(response) = intercept(&state, &format!("/v1/keys/{key}")) {
        return response;
    }
    let fields = parse_form(&body);
    let Some(value) = fields.get("value").cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "errorCode": 200,
                "message": "Value is Required in POST form",
                "cause": "Set",
            })),
        )
            .into_response();
    };

    let mut store = state.store.lock().unwrap();
    let previous = store.entries.get(&key).map(|entry| entry.value.clone());
    if let Some(expected) = fields.get("prevValue") {
        if previous.as_deref() != Some(expected.as_str()) {
            return (
                StatusCode::PRECONDITION_FAILED,
                Json(json!({
                    "errorCode": 101,
                    "message": "The given PrevValue is not equal to the value of the key",
                    "cause": format!(
                        "TestAndSet: {} != {}",
                        expected,
                        previous.unwrap_or_default()
                    ),
                })),
            )
                .into_response();
        }
    }

    let ttl = fields.get("ttl").and_then(|ttl| ttl.parse().ok());
    store.index += 1;
    store.entries.insert(key.clone(), Entry { value: value.clone(), ttl });
    Json(json!({
        "action": "SET",
        "key": format!("/{key}"),
        "prevValue": previous,
        "value": value,
        "index": store.index,
    }))
    .into_response()
}

async fn delete_key(State(state): State<MockState>, Path(key): Path<String>) -> Response {
    if let Some(response) = intercept(&state, &format!("/v1/keys/{key}")) {
        return response;
    }
    let mut store = state.store.lock().unwrap();
    match store.entries.remove(&key) {
        Some(entry) => {
            store.index += 1;
            Json(json!({
                "action": "DELETE",
                "key": format!("/{key}"),
                "prevValue": entry.value,
                "index": store.index,
            }))
            .into_response()
        }
        None => key_not_found(&key),
    }
}

async fn leader(State(state): State<MockState>) -> Response {
    if let Some(response) = intercept(&state, "/v1/leader") {
        return response;
    }
    state.leader.clone().into_response()
}

/// Counts the request and short-circuits non-normal modes.
fn intercept(state: &MockState, path: &str) -> Option<Response> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match &state.mode {
        Mode::Normal => None,
        Mode::Garbage => Some(
            (StatusCode::INTERNAL_SERVER_ERROR, "<html>internal error</html>").into_response(),
        ),
        Mode::Redirect(base) => Some(
            (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, format!("{base}{path}"))]).into_response(),
        ),
    }
}

fn key_not_found(key: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"errorCode": 100, "message": "Key Not Found", "cause": format!("/{key}")})),
    )
        .into_response()
}

/// Splits `name=value;name=value` and undoes form encoding per field.
fn parse_form(body: &str) -> HashMap<String, String> {
    body.split(';')
        .flat_map(|field| form_urlencoded::parse(field.as_bytes()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}
