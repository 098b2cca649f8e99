use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::server::ServerAddress;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Query a coordination service with server failover",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Candidate servers as host:port, tried in order. Repeat or comma-separate.
    #[arg(long = "server", value_delimiter = ',', default_value = "127.0.0.1:4001")]
    pub servers: Vec<ServerAddress>,

    /// Per-request timeout in milliseconds. Uses the client default when omitted.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl ConnectionArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value stored under a key.
    Get { key: String },
    /// Store a value under a key.
    Set {
        key: String,
        value: String,
        /// Only write if the current value equals this.
        #[arg(long)]
        prev_value: Option<String>,
        /// Expire the key after this many seconds.
        #[arg(long)]
        ttl: Option<u32>,
    },
    /// Remove a key.
    Delete { key: String },
    /// Print the current leader.
    Leader,
}
