// src/bin/control.rs
//! `control id info [mapper]`: visit-log server for one airport.

use std::process::ExitCode;

use clap::Parser;
use skymap::codec::parse_port;
use skymap::control::{report_to_mapper, ControlIdentity};
use skymap::registry::Registry;
use skymap::{Control, Listener, ServerConfig};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "control", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Airport id reported to the mapper.
    #[arg(allow_hyphen_values = true)]
    id: String,
    /// Line sent back to every visiting aircraft.
    #[arg(allow_hyphen_values = true)]
    info: String,
    /// Port of a mapper to register with.
    #[arg(allow_hyphen_values = true)]
    mapper: Option<String>,
}

/// Exit statuses, one per startup failure.
#[derive(Debug, Clone, Copy)]
enum Exit {
    Usage = 1,
    InvalidChar = 2,
    InvalidPort = 3,
    MapperUnreachable = 4,
}

impl Exit {
    fn fail(self) -> ExitCode {
        let msg = match self {
            Exit::Usage => "Usage: control id info [mapper]",
            Exit::InvalidChar => "Invalid char in parameter",
            Exit::InvalidPort => "Invalid port",
            Exit::MapperUnreachable => "Can not connect to map",
        };
        eprintln!("{msg}");
        ExitCode::from(self as u8)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    skymap::init_tracing();

    let Ok(cli) = Cli::try_parse() else {
        return Exit::Usage.fail();
    };
    let Some(identity) = ControlIdentity::new(cli.id, cli.info) else {
        return Exit::InvalidChar.fail();
    };
    let mapper_port = match cli.mapper.as_deref().map(parse_port) {
        None => None,
        Some(Some(port)) => Some(port),
        Some(None) => return Exit::InvalidPort.fail(),
    };

    let listener = match Listener::bind(&ServerConfig::default()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "control failed to start");
            eprintln!("Failed to listen");
            return ExitCode::from(5);
        }
    };
    let port = listener.local_port();
    println!("{port}");

    if let Some(mapper_port) = mapper_port {
        if let Err(e) = report_to_mapper(mapper_port, &identity.id, port).await {
            error!(error = %e, "bootstrap registration failed");
            return Exit::MapperUnreachable.fail();
        }
    }

    match listener
        .serve(Control::new(identity.info), Registry::shared())
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "control stopped");
            ExitCode::from(5)
        }
    }
}
