// src/bin/roc.rs
//! `roc id mapper {airports}`: fly a route and print each control's info.
//!
//! `mapper` is a port, or `-` when every destination is already a port.

use std::process::ExitCode;

use clap::Parser;
use skymap::client::{collect_log, numeric_destinations, resolve_destinations};
use skymap::codec::parse_port;
use skymap::ClientError;

#[derive(Debug, Parser)]
#[command(name = "roc", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Aircraft id announced to each control.
    #[arg(allow_hyphen_values = true)]
    id: String,
    /// Mapper port, or `-` for none.
    #[arg(allow_hyphen_values = true)]
    mapper: String,
    /// Destinations: airport ids or ports.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    airports: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Exit {
    Usage = 1,
    InvalidMapperPort = 2,
    MapperRequired = 3,
    MapperUnreachable = 4,
    NoMapEntry = 5,
    DestinationFailed = 6,
}

impl Exit {
    fn fail(self) -> ExitCode {
        let msg = match self {
            Exit::Usage => "Usage: roc id mapper {airports}",
            Exit::InvalidMapperPort => "Invalid mapper port",
            Exit::MapperRequired => "Mapper required",
            Exit::MapperUnreachable => "Failed to connect to mapper",
            Exit::NoMapEntry => "No map entry for destination",
            Exit::DestinationFailed => "Failed to connect to at least one destination",
        };
        eprintln!("{msg}");
        ExitCode::from(self as u8)
    }
}

impl From<ClientError> for Exit {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::MapperUnreachable { .. } => Exit::MapperUnreachable,
            ClientError::NoMapEntry { .. } => Exit::NoMapEntry,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    skymap::init_tracing();

    let Ok(cli) = Cli::try_parse() else {
        return Exit::Usage.fail();
    };

    let ports = if cli.mapper == "-" {
        match numeric_destinations(&cli.airports) {
            Some(ports) => ports,
            None => return Exit::MapperRequired.fail(),
        }
    } else {
        let Some(mapper_port) = parse_port(&cli.mapper) else {
            return Exit::InvalidMapperPort.fail();
        };
        match resolve_destinations(mapper_port, &cli.airports).await {
            Ok(ports) => ports,
            Err(e) => {
                tracing::error!(error = %e, "route resolution failed");
                return Exit::from(e).fail();
            }
        }
    };

    let log = collect_log(&cli.id, &ports).await;
    for line in &log.entries {
        println!("{line}");
    }
    if log.failed {
        return Exit::DestinationFailed.fail();
    }
    ExitCode::SUCCESS
}
