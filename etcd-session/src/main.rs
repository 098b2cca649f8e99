use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use etcd_session::{
    cli::{Cli, Command},
    transport::{self, HttpTransport, TransportConfig},
    OperationResult, Session,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let servers = cli.connection.servers.clone();
    info!(servers = servers.len(), "opening session");

    let session = match cli.connection.timeout() {
        Some(timeout) => {
            let transport = HttpTransport::with_config(&TransportConfig {
                timeout: Some(timeout),
            })
            .context("failed to build http transport")?;
            Session::with_transport(servers, Arc::new(transport))
        }
        None => Session::open(servers).context("failed to open session")?,
    };

    let code = run(&session, cli.command);
    session.close();
    transport::shutdown();

    Ok(code)
}

fn run(session: &Session, command: Command) -> ExitCode {
    match command {
        Command::Get { key } => print_value(session.get(&key), &key),
        Command::Leader => print_value(session.leader(), "leader"),
        Command::Set {
            key,
            value,
            prev_value,
            ttl,
        } => report(session.set(&key, &value, prev_value.as_deref(), ttl), &key),
        Command::Delete { key } => report(session.delete(&key), &key),
    }
}

fn print_value(value: Option<String>, what: &str) -> ExitCode {
    match value {
        Some(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{what} not found");
            ExitCode::FAILURE
        }
    }
}

fn report(result: OperationResult, key: &str) -> ExitCode {
    match result {
        OperationResult::Success => {
            println!("OK");
            ExitCode::SUCCESS
        }
        OperationResult::ProtocolError => {
            eprintln!("server rejected the request for {key}");
            ExitCode::FAILURE
        }
        OperationResult::TransportOrUnknownError => {
            eprintln!("could not confirm the outcome for {key}");
            ExitCode::FAILURE
        }
    }
}
