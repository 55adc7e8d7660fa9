// src/error.rs
//! Error types for the servers and the route client.

use std::io;

/// Failures that stop a server from starting or serving.
///
/// Per-connection problems never surface here: a handler that loses its
/// peer simply ends.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying socket error.
        source: io::Error,
    },

    /// The control could not reach the mapper it was told to report to.
    #[error("cannot reach mapper on port {port}: {source}")]
    MapperUnreachable {
        /// Mapper port given at startup.
        port: u16,
        /// Underlying socket error.
        source: io::Error,
    },

    /// Any other socket error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Failures of the `roc` client while talking to the mapper.
///
/// Destination failures are not errors: they are recorded on the flight
/// log and reported once at the end.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting to the mapper failed.
    #[error("failed to connect to mapper on port {port}")]
    MapperUnreachable {
        /// Mapper port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The mapper has no entry for a destination, or answered garbage.
    #[error("no map entry for destination {id}")]
    NoMapEntry {
        /// Destination id that could not be resolved.
        id: String,
    },
}
