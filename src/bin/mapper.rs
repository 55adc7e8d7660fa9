// src/bin/mapper.rs
//! `mapper`: airport directory server. Takes no arguments, prints its port.

use std::process::ExitCode;

use clap::Parser;
use skymap::registry::Registry;
use skymap::{Listener, Mapper, ServerConfig};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "mapper", disable_help_flag = true, disable_version_flag = true)]
struct Cli {}

#[tokio::main]
async fn main() -> ExitCode {
    skymap::init_tracing();

    if Cli::try_parse().is_err() {
        return ExitCode::from(1);
    }

    let listener = match Listener::bind(&ServerConfig::default()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "mapper failed to start");
            eprintln!("Failed to listen");
            return ExitCode::from(2);
        }
    };
    println!("{}", listener.local_port());

    match listener.serve(Mapper, Registry::shared()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mapper stopped");
            ExitCode::from(2)
        }
    }
}
