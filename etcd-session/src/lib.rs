//! Blocking client for an etcd-style coordination service.
//!
//! A [`Session`] holds an ordered list of candidate servers. Each operation
//! is sent to the first server and fails over to the next one until an
//! answer settles it:
//!
//! - `get` and `leader` return the first value any server delivers, or `None`.
//! - `set` stops at the first server that accepts *or rejects* the write.
//! - `delete` stops only at the first server that accepts it.
//!
//! Modules, leaf-first:
//!
//! - [`request`] builds URLs and form bodies.
//! - [`response`] classifies response bodies per operation.
//! - [`transport`] issues one HTTP request against one server and owns the
//!   process-wide HTTP client.
//! - [`session`] runs the failover loop.
//! - [`cli`] is the command-line surface of the `etcd-session` binary.

pub mod cli;
pub mod error;
pub mod request;
pub mod response;
pub mod server;
pub mod session;
pub mod transport;

pub use error::{Error, Result, TransportError};
pub use response::OperationResult;
pub use server::ServerAddress;
pub use session::Session;
