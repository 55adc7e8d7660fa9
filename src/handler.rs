// src/handler.rs
//! Per-connection read → dispatch → respond loop.
//!
//! A handler owns its stream until it closes it. Each request takes the
//! registry lock for exactly one operation inside [`Role::dispatch`]; the
//! guard is dropped before any socket I/O.

use bytes::Bytes;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::codec::{read_frame, Frame, MAX_LINE};
use crate::registry::{Entry, Registry, SharedRegistry};

/// What a handler does after dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to send; keep reading.
    Silent,
    /// Send these bytes, then keep reading.
    Send(Bytes),
    /// Send these bytes, then close the connection.
    Close(Bytes),
}

/// A server kind: which entries it stores and how it answers a line.
pub trait Role: Send + Sync + 'static {
    type Entry: Entry;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handle one well-framed line.
    ///
    /// Implementations lock `registry` for a single operation and must not
    /// return while holding the guard.
    fn dispatch(&self, line: &str, registry: &Mutex<Registry<Self::Entry>>) -> Reply;
}

/// Serve one connection until the peer leaves, an I/O error occurs, the
/// role asks to close, or the optional idle timeout fires.
pub async fn handle_connection<S, R>(
    stream: S,
    role: Arc<R>,
    registry: SharedRegistry<R::Entry>,
    idle_timeout: Option<Duration>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Role,
{
    match serve_lines(stream, &*role, &registry, idle_timeout).await {
        Ok(()) => debug!(role = role.name(), "connection closed"),
        Err(e) => debug!(role = role.name(), error = %e, "connection dropped"),
    }
}

async fn serve_lines<S, R>(
    stream: S,
    role: &R,
    registry: &Mutex<Registry<R::Entry>>,
    idle_timeout: Option<Duration>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: Role,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::with_capacity(MAX_LINE + 1);

    loop {
        let read = read_frame(&mut reader, &mut buf);
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(next) => next?,
                Err(_) => {
                    debug!(role = role.name(), ?limit, "idle timeout");
                    return Ok(());
                }
            },
            None => read.await?,
        };

        let line = match next {
            None => return Ok(()),
            Some(Frame::Invalid) => {
                debug!(role = role.name(), "ignoring malformed line");
                continue;
            }
            Some(Frame::Line(line)) => line,
        };

        match role.dispatch(&line, registry) {
            Reply::Silent => {}
            Reply::Send(bytes) => writer.write_all(&bytes).await?,
            Reply::Close(bytes) => {
                writer.write_all(&bytes).await?;
                writer.shutdown().await?;
                return Ok(());
            }
        }
    }
}
