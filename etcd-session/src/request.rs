//! Wire representation of a single request against one server.
//!
//! Nothing in here performs I/O.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;

use crate::server::ServerAddress;

/// Bytes escaped in keys. `/` stays literal since keys are paths; `?` and `#`
/// would otherwise end the path early.
const KEY_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'%').add(b'?').add(b'#');

/// Keyspace prefix for `get`/`set`/`delete`.
pub const KEYS_PREFIX: &str = "keys/";

/// Key under the empty prefix that addresses the leader endpoint.
pub const LEADER_KEY: &str = "leader";

/// Body of a write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBody {
    /// No value: issue a `DELETE` without a body.
    Delete,
    /// Form-encoded `POST` payload.
    Form(String),
}

/// `http://{host}:{port}/v1/{prefix}{key}`
///
/// The key keeps its `/` separators; `?`, `#`, `%`, spaces and control
/// characters are percent-encoded.
pub fn read_url(server: &ServerAddress, key: &str, prefix: &str) -> String {
    format!(
        "http://{}:{}/v1/{}{}",
        server.host,
        server.port,
        prefix,
        utf8_percent_encode(key, KEY_ESCAPES)
    )
}

/// `http://{host}:{port}/v1/keys/{key}`, key encoded as in [`read_url`].
pub fn write_url(server: &ServerAddress, key: &str) -> String {
    read_url(server, key, KEYS_PREFIX)
}

/// Builds `value=V[;prevValue=P][;ttl=N]`.
///
/// A missing value means delete, and then `precondition` and `ttl` are
/// ignored. A TTL of zero is the same as no TTL.
pub fn write_body(
    value: Option<&str>,
    precondition: Option<&str>,
    ttl: Option<u32>,
) -> WriteBody {
    let Some(value) = value else {
        return WriteBody::Delete;
    };

    let mut body = format!("value={}", form_encode(value));
    if let Some(precondition) = precondition {
        body.push_str(";prevValue=");
        body.push_str(&form_encode(precondition));
    }
    if let Some(ttl) = ttl.filter(|ttl| *ttl > 0) {
        body.push_str(&format!(";ttl={ttl}"));
    }

    WriteBody::Form(body)
}

/// Keeps `;`, `=` and `&` inside user values from breaking the field list.
fn form_encode(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes()).collect()
}
