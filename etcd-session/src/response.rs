//! Interpreting response bodies, one classifier per operation family.
//!
//! Classifiers only ever see a body that was actually delivered; transport
//! failures are handled before they run.

use serde_json::Value;

/// Outcome of a `set` or `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// The server acknowledged the write with an index.
    Success,
    /// The server answered but rejected the request, e.g. a failed precondition.
    ProtocolError,
    /// No server confirmed the outcome. The write may or may not have happened.
    TransportOrUnknownError,
}

impl OperationResult {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// `{"value": "<string>", ...}` yields the string; anything else is not found.
pub fn classify_get(body: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;
    document.get("value")?.as_str().map(str::to_owned)
}

/// A numeric `index` field means success. Any other body that made it back
/// from the server is a rejection (`{"errorCode": ..., "cause": ...}` or
/// something unrecognizable).
pub fn classify_write(body: &str) -> OperationResult {
    let acknowledged = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|document| document.get("index").map(Value::is_number))
        .unwrap_or(false);

    if acknowledged {
        OperationResult::Success
    } else {
        OperationResult::ProtocolError
    }
}

/// The leader endpoint answers in plain text, taken verbatim. An empty body
/// carries no leader.
pub fn classify_leader(body: &str) -> Option<String> {
    (!body.is_empty()).then(|| body.to_owned())
}
