// src/listener.rs
//! Accept loop: one spawned handler per connection, one shared registry.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug_span, info, warn, Instrument};

use crate::error::ServerError;
use crate::handler::{handle_connection, Role};
use crate::registry::SharedRegistry;

/// Pause after a failed `accept`.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Immutable server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where to listen. Port 0 asks the OS for an ephemeral port.
    pub bind_addr: SocketAddr,
    /// Stop accepting after this many connections over the server's life.
    pub max_connections: Option<usize>,
    /// Close connections that stay silent this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            max_connections: None,
            idle_timeout: None,
        }
    }
}

/// A bound listening socket, ready to serve.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    port: u16,
    config: ServerConfig,
}

impl Listener {
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let bind_err = |source| ServerError::Bind {
            addr: config.bind_addr.to_string(),
            source,
        };
        let inner = TcpListener::bind(config.bind_addr).await.map_err(bind_err)?;
        let port = inner.local_addr().map_err(bind_err)?.port();
        Ok(Self {
            inner,
            port,
            config: config.clone(),
        })
    }

    /// The port actually bound.
    pub fn local_port(&self) -> u16 {
        self.port
    }

    /// Accept connections until the configured limit (forever by default).
    ///
    /// Handlers are detached: returning does not wait for them.
    pub async fn serve<R: Role>(
        self,
        role: R,
        registry: SharedRegistry<R::Entry>,
    ) -> Result<(), ServerError> {
        let role = Arc::new(role);
        let mut accepted = 0usize;
        info!(role = role.name(), port = self.port, "listening");

        while self.config.max_connections.map_or(true, |max| accepted < max) {
            let (socket, peer) = match self.inner.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(role = role.name(), error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            accepted += 1;

            let span = debug_span!("conn", role = role.name(), %peer, n = accepted);
            tokio::spawn(
                handle_connection(socket, role.clone(), registry.clone(), self.config.idle_timeout)
                    .instrument(span),
            );
        }

        info!(role = role.name(), accepted, "connection limit reached");
        Ok(())
    }

    /// Run [`Listener::serve`] on a background task.
    pub fn spawn<R: Role>(
        self,
        role: R,
        registry: SharedRegistry<R::Entry>,
    ) -> JoinHandle<Result<(), ServerError>> {
        tokio::spawn(self.serve(role, registry))
    }
}
