//! Per-connection handlers for the two listening channels.
//!
//! - `ConnectorConnection` reads server and room events from a backend
//!   connector and applies them to the registry. When it closes, for any
//!   reason, every server is forgotten.
//! - `ClientConnection` answers each `Lookup` line with one `Index` line.
//!
//! Both read newline-delimited JSON. Malformed lines are logged and
//! skipped; oversized lines close the connection.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Connection errors are logged and result in graceful disconnect

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use registry_protocol::{ClientRequest, ConnectorEvent, Index};

use crate::dispatch::EventDispatcher;
use crate::lookup::LookupService;
use crate::registry::RegistryError;

/// Maximum message size (1 MB)
pub const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Read timeout for idle client connections (5 minutes)
const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads one newline-terminated frame, bounded by `MAX_MESSAGE_SIZE`.
///
/// Returns the raw bytes without the terminator. Text decoding is left to
/// the caller so that a bad byte only costs that one line.
async fn read_frame(reader: &mut BufReader<OwnedReadHalf>) -> Result<Vec<u8>, ConnectionError> {
    let mut frame = Vec::new();
    let limit = (MAX_MESSAGE_SIZE + 1) as u64;

    let bytes_read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut frame)
        .await
        .map_err(|e| ConnectionError::Io(e.to_string()))?;

    if bytes_read == 0 {
        return Err(ConnectionError::Eof);
    }

    if frame.len() > MAX_MESSAGE_SIZE {
        return Err(ConnectionError::MessageTooLarge {
            size: frame.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    while matches!(frame.last(), Some(b'\n' | b'\r')) {
        frame.pop();
    }
    Ok(frame)
}

// ============================================================================
// Connector Channel
// ============================================================================

/// Handler for a single connector connection.
pub struct ConnectorConnection {
    reader: BufReader<OwnedReadHalf>,
    dispatcher: EventDispatcher,
    cancel_token: CancellationToken,
    connection_number: u64,
}

impl ConnectorConnection {
    /// Creates a connector handler.
    ///
    /// The write half is dropped; the connector channel is one-way.
    pub fn new(
        reader: OwnedReadHalf,
        dispatcher: EventDispatcher,
        cancel_token: CancellationToken,
        connection_number: u64,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            dispatcher,
            cancel_token,
            connection_number,
        }
    }

    /// Processes events until the connection closes, then clears the
    /// registry.
    pub async fn run(mut self) {
        info!(connection = self.connection_number, "Connector connected");

        let cancel_token = self.cancel_token.clone();
        let result = tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!(connection = self.connection_number, "Connector handler cancelled");
                Ok(())
            }
            result = self.process_events() => result,
        };

        if let Err(e) = result {
            warn!(
                connection = self.connection_number,
                error = %e,
                "Connector connection failed"
            );
        }

        if let Err(e) = self.dispatcher.connector_lost().await {
            error!(error = %e, "Failed to clear registry after connector loss");
        }

        info!(connection = self.connection_number, "Connector disconnected");
    }

    async fn process_events(&mut self) -> Result<(), ConnectionError> {
        loop {
            let frame = match read_frame(&mut self.reader).await {
                Ok(frame) => frame,
                Err(ConnectionError::Eof) => {
                    debug!(connection = self.connection_number, "Connector sent EOF");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            let line = match std::str::from_utf8(&frame) {
                Ok(line) => line,
                Err(e) => {
                    warn!(connection = self.connection_number, error = %e, "Connector message is not valid UTF-8");
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match ConnectorEvent::decode(line) {
                Ok(Some(event)) => {
                    self.dispatcher.dispatch(event).await?;
                }
                Ok(None) => {
                    debug!(connection = self.connection_number, "Ignoring unrouted connector message");
                }
                Err(e) => {
                    warn!(connection = self.connection_number, error = %e, "Malformed connector message");
                }
            }
        }
    }
}

// ============================================================================
// Client Channel
// ============================================================================

/// Handler for a single client connection.
pub struct ClientConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    lookups: LookupService,
    cancel_token: CancellationToken,
    connection_number: u64,
}

impl ClientConnection {
    pub fn new(
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        lookups: LookupService,
        cancel_token: CancellationToken,
        connection_number: u64,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            lookups,
            cancel_token,
            connection_number,
        }
    }

    /// Answers lookups until the client disconnects or goes idle.
    pub async fn run(mut self) {
        debug!(connection = self.connection_number, "Client connected");

        let cancel_token = self.cancel_token.clone();
        let result = tokio::select! {
            _ = cancel_token.cancelled() => Ok(()),
            result = self.process_requests() => result,
        };

        if let Err(e) = result {
            debug!(
                connection = self.connection_number,
                error = %e,
                "Client connection closed"
            );
        }

        debug!(connection = self.connection_number, "Client disconnected");
    }

    async fn process_requests(&mut self) -> Result<(), ConnectionError> {
        loop {
            let frame = match timeout(CLIENT_READ_TIMEOUT, read_frame(&mut self.reader)).await {
                Ok(Ok(frame)) => frame,
                Ok(Err(ConnectionError::Eof)) => return Ok(()),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ConnectionError::Timeout),
            };

            let line = match std::str::from_utf8(&frame) {
                Ok(line) => line,
                Err(e) => {
                    warn!(connection = self.connection_number, error = %e, "Client message is not valid UTF-8");
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match ClientRequest::decode(line) {
                Ok(Some(request)) => {
                    let index = self.lookups.handle(request).await;
                    self.send_index(&index).await?;
                }
                Ok(None) => {
                    debug!(connection = self.connection_number, "Ignoring unrouted client message");
                }
                Err(e) => {
                    warn!(connection = self.connection_number, error = %e, "Malformed client message");
                }
            }
        }
    }

    /// Sends a reply line to the client.
    async fn send_index(&mut self, index: &Index) -> Result<(), ConnectionError> {
        let json =
            serde_json::to_string(index).map_err(|e| ConnectionError::ParseError(e.to_string()))?;

        let writer = &mut self.writer;
        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed")]
    Eof,

    #[error("Read timeout")]
    Timeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
