//! HTTP collaborator and the single-server executor.
//!
//! A [`Transport`] issues exactly one request and hands back the buffered
//! body. [`execute`] wraps it so callers only ever see a [`RawOutcome`];
//! retrying is left to the session.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result, TransportError};
use crate::request::WriteBody;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Process-wide client shared by sessions opened through [`crate::Session::open`].
static SHARED_CLIENT: RwLock<Option<Client>> = RwLock::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Result of one attempt against one server.
#[derive(Debug)]
pub enum RawOutcome {
    /// Nothing came back; the error is kept for diagnostics only.
    TransportFailure(TransportError),
    /// The server answered. Status codes are not inspected.
    Delivered(String),
}

/// Anything able to issue a single HTTP request and buffer the response body.
///
/// Implementations must follow redirects and must not treat non-2xx
/// statuses as failures.
pub trait Transport: Send + Sync {
    fn issue(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
    ) -> std::result::Result<String, TransportError>;
}

/// Sends one request and folds any transport error into [`RawOutcome`].
pub fn execute(
    transport: &dyn Transport,
    method: Method,
    url: &str,
    body: Option<&str>,
) -> RawOutcome {
    match transport.issue(method, url, body) {
        Ok(body) => RawOutcome::Delivered(body),
        Err(err) => RawOutcome::TransportFailure(err),
    }
}

/// `POST` when there is a form body, `DELETE` otherwise.
pub fn execute_write(transport: &dyn Transport, url: &str, body: &WriteBody) -> RawOutcome {
    match body {
        WriteBody::Form(form) => execute(transport, Method::Post, url, Some(form)),
        WriteBody::Delete => execute(transport, Method::Delete, url, None),
    }
}

/// Knobs for a dedicated [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Whole-request timeout. `None` keeps the client default.
    pub timeout: Option<Duration>,
}

/// Blocking reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Uses the process-wide client, initializing it on first use.
    pub fn shared() -> Result<Self> {
        Ok(Self { client: init()? })
    }

    /// Builds a transport with its own client.
    pub fn with_config(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl Transport for HttpTransport {
    fn issue(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
    ) -> std::result::Result<String, TransportError> {
        let request = match method {
            Method::Get => self.client.get(url),
            Method::Delete => self.client.delete(url),
            Method::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.unwrap_or_default().to_owned()),
        };

        request
            .send()
            .and_then(|response| response.text())
            .map_err(|source| TransportError::Http {
                url: url.to_owned(),
                source,
            })
    }
}

/// Initializes the shared HTTP client once. Safe to call repeatedly and from
/// several threads; later calls return a handle to the same client.
pub fn init() -> Result<Client> {
    if let Some(client) = SHARED_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Ok(client.clone());
    }

    let mut slot = SHARED_CLIENT.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(client) = slot.as_ref() {
        return Ok(client.clone());
    }
    let client = build_client(&TransportConfig::default())?;
    *slot = Some(client.clone());
    Ok(client)
}

/// Releases the shared client. Sessions that already hold a handle keep
/// working; the next [`init`] builds a fresh client.
pub fn shutdown() {
    let released = SHARED_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    drop(released);
}

/// Whether the shared client is currently initialized.
pub fn is_initialized() -> bool {
    SHARED_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

fn build_client(config: &TransportConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(Error::ClientBuild)
}
