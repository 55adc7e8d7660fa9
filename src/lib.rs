// src/lib.rs
//! skymap: a tiny airport directory and visit-log network.
//!
//! Two server roles share one concurrent core:
//! - the **mapper** keeps an ordered directory of airport id → port,
//! - a **control** keeps an ordered log of visiting aircraft.
//!
//! Each server binds an ephemeral loopback port, spawns one task per
//! accepted connection and funnels every registry operation through a
//! single lock. The `roc` client ([`client`]) resolves destinations through
//! the mapper and collects info lines from controls.

pub mod client;
pub mod codec;
pub mod control;
pub mod error;
pub mod handler;
pub mod listener;
pub mod mapper;
pub mod registry;

pub use control::Control;
pub use error::{ClientError, ServerError};
pub use listener::{Listener, ServerConfig};
pub use mapper::Mapper;
pub use registry::{Registry, SharedRegistry};

/// Installs the stderr `tracing` subscriber used by the binaries.
///
/// Stdout is reserved for protocol-visible output (the bound port, the
/// flight log), so diagnostics never go there.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
