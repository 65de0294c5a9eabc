//! TCP server for the registry daemon.
//!
//! The server:
//! - Listens on the connector address for backend server events
//! - Listens on the client address for room lookups
//! - Spawns a handler task per connection
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │            RegistryServer            │
//! │                                      │
//! │  TcpListener (7040)  TcpListener (6090)
//! └───────┬───────────────────┬──────────┘
//!         │ accept()          │ accept()
//!         ▼                   ▼
//! ┌───────────────────┐ ┌───────────────────┐
//! │ConnectorConnection│ │ ClientConnection  │
//! │  EventDispatcher  │ │  LookupService    │
//! └─────────┬─────────┘ └─────────┬─────────┘
//!           │                     │
//!           └──────────┬──────────┘
//!                      ▼
//!             ┌─────────────────┐
//!             │  RegistryHandle │
//!             └─────────────────┘
//! ```

mod connection;

pub use connection::{ClientConnection, ConnectionError, ConnectorConnection, MAX_MESSAGE_SIZE};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::dispatch::EventDispatcher;
use crate::lookup::LookupService;
use crate::registry::RegistryHandle;

/// TCP server for the connector and client channels.
pub struct RegistryServer {
    connector_listener: TcpListener,
    client_listener: TcpListener,

    /// Handle to the server registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter shared by both channels, for log correlation
    connection_counter: AtomicU64,
}

impl RegistryServer {
    /// Binds both listeners.
    ///
    /// Binding happens up front so callers can read the actual local
    /// addresses (useful with port 0) before calling `run`.
    pub async fn bind(
        connector_addr: &str,
        client_addr: &str,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let connector_listener = bind_listener(connector_addr).await?;
        let client_listener = bind_listener(client_addr).await?;

        Ok(Self {
            connector_listener,
            client_listener,
            registry,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Returns the bound connector channel address.
    pub fn connector_addr(&self) -> Result<SocketAddr, ServerError> {
        self.connector_listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Returns the bound client channel address.
    pub fn client_addr(&self) -> Result<SocketAddr, ServerError> {
        self.client_listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Runs the server.
    ///
    /// Accepts connections on both channels until the cancellation token is
    /// triggered.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(
            connector = %self.connector_addr()?,
            client = %self.client_addr()?,
            "Registry server listening"
        );

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.connector_listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.handle_connector(stream, peer),
                        Err(e) => error!(error = %e, "Failed to accept connector connection"),
                    }
                }

                result = self.client_listener.accept() => {
                    match result {
                        Ok((stream, _peer)) => self.handle_client(stream),
                        Err(e) => error!(error = %e, "Failed to accept client connection"),
                    }
                }
            }
        }

        Ok(())
    }

    fn next_connection_number(&self) -> u64 {
        self.connection_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Spawns a handler for a new connector connection.
    fn handle_connector(&self, stream: TcpStream, peer: SocketAddr) {
        let connection_number = self.next_connection_number();
        info!(connection = connection_number, peer = %peer, "Accepted connector connection");

        let (reader, _writer) = stream.into_split();
        let handler = ConnectorConnection::new(
            reader,
            EventDispatcher::new(self.registry.clone()),
            self.cancel_token.child_token(),
            connection_number,
        );

        tokio::spawn(handler.run());
    }

    /// Spawns a handler for a new client connection.
    fn handle_client(&self, stream: TcpStream) {
        let connection_number = self.next_connection_number();

        let (reader, writer) = stream.into_split();
        let handler = ClientConnection::new(
            reader,
            writer,
            LookupService::new(self.registry.clone()),
            self.cancel_token.child_token(),
            connection_number,
        );

        tokio::spawn(handler.run());
    }
}

async fn bind_listener(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        })
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("Failed to read local address: {0}")]
    LocalAddr(String),
}
