//! Sessions and the failover loop.
//!
//! Every operation walks the configured servers from the first to the last
//! and stops as soon as an answer settles it. Nothing is remembered between
//! calls, so each call starts again at the first server.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::request::{self, KEYS_PREFIX, LEADER_KEY};
use crate::response::{self, OperationResult};
use crate::server::ServerAddress;
use crate::transport::{self, HttpTransport, Method, RawOutcome, Transport};

/// Read-only handle on a list of candidate servers.
///
/// A session owns no connections. Cloning is cheap and clones can be used
/// from several threads at once.
#[derive(Clone)]
pub struct Session {
    servers: Arc<[ServerAddress]>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("servers", &self.servers)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a session over `servers`, tried in the given order.
    ///
    /// Initializes the process-wide HTTP client on first use.
    pub fn open(servers: impl IntoIterator<Item = ServerAddress>) -> Result<Self> {
        let transport = HttpTransport::shared()?;
        Ok(Self::with_transport(servers, Arc::new(transport)))
    }

    /// Opens a session that sends requests through `transport`.
    pub fn with_transport(
        servers: impl IntoIterator<Item = ServerAddress>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            servers: servers.into_iter().collect(),
            transport,
        }
    }

    /// Releases the session. Values already returned are unaffected.
    pub fn close(self) {}

    pub fn servers(&self) -> &[ServerAddress] {
        &self.servers
    }

    /// Value stored under `key`, from the first server that has one.
    ///
    /// `None` covers a missing key, unusable responses and unreachable
    /// servers alike.
    pub fn get(&self, key: &str) -> Option<String> {
        self.first_found("get", key, KEYS_PREFIX, response::classify_get)
    }

    /// Identifier of the current leader, from the first server that reports one.
    pub fn leader(&self) -> Option<String> {
        self.first_found("leader", LEADER_KEY, "", response::classify_leader)
    }

    /// Stores `value` under `key`, optionally only if the current value equals
    /// `precondition`, optionally expiring after `ttl` seconds (zero means no
    /// expiry).
    ///
    /// Stops at the first server that accepts or rejects the write. Only a
    /// transport failure moves on to the next server.
    pub fn set(
        &self,
        key: &str,
        value: &str,
        precondition: Option<&str>,
        ttl: Option<u32>,
    ) -> OperationResult {
        let body = request::write_body(Some(value), precondition, ttl);
        let mut result = OperationResult::TransportOrUnknownError;

        for server in self.servers.iter() {
            result = self.write_one(server, key, &body);
            match result {
                OperationResult::Success | OperationResult::ProtocolError => return result,
                OperationResult::TransportOrUnknownError => {
                    debug!(%server, key, "set not confirmed, trying next server");
                }
            }
        }

        result
    }

    /// Removes `key`.
    ///
    /// Unlike [`Session::set`], a rejection does not end the loop: only a
    /// success does. Once every server has been tried the last server's
    /// outcome is returned.
    pub fn delete(&self, key: &str) -> OperationResult {
        let body = request::write_body(None, None, None);
        let mut result = OperationResult::TransportOrUnknownError;

        for server in self.servers.iter() {
            result = self.write_one(server, key, &body);
            if result.is_success() {
                return result;
            }
            debug!(%server, key, ?result, "delete not confirmed, trying next server");
        }

        result
    }

    fn first_found(
        &self,
        op: &'static str,
        key: &str,
        prefix: &str,
        classify: fn(&str) -> Option<String>,
    ) -> Option<String> {
        for server in self.servers.iter() {
            let url = request::read_url(server, key, prefix);
            debug!(op, %server, %url, "sending request");

            match transport::execute(self.transport.as_ref(), Method::Get, &url, None) {
                RawOutcome::Delivered(body) => {
                    trace!(op, %server, %body, "response body");
                    if let Some(value) = classify(&body) {
                        return Some(value);
                    }
                    debug!(op, %server, "no usable value, trying next server");
                }
                RawOutcome::TransportFailure(error) => {
                    debug!(op, %server, %error, "transport failure, trying next server");
                }
            }
        }

        debug!(op, key, servers = self.servers.len(), "exhausted server list");
        None
    }

    fn write_one(
        &self,
        server: &ServerAddress,
        key: &str,
        body: &request::WriteBody,
    ) -> OperationResult {
        let url = request::write_url(server, key);
        debug!(%server, %url, "sending write");

        match transport::execute_write(self.transport.as_ref(), &url, body) {
            // An empty reply confirms nothing, same as no reply.
            RawOutcome::Delivered(body) if body.is_empty() => {
                debug!(%server, "empty response body");
                OperationResult::TransportOrUnknownError
            }
            RawOutcome::Delivered(body) => {
                trace!(%server, %body, "response body");
                response::classify_write(&body)
            }
            RawOutcome::TransportFailure(error) => {
                debug!(%server, %error, "transport failure");
                OperationResult::TransportOrUnknownError
            }
        }
    }
}
