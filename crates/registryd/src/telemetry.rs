//! Periodic telemetry for the registry daemon.
//!
//! On every tick the telemetry task takes a snapshot from the registry actor
//! (lookups served since the previous tick plus the full server tree) and
//! emits it as `HitCounterLog` and `ServerTreeLog`. Both are written to the
//! tracing output and, when a logger address is configured, sent as JSON
//! lines over TCP.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Logger I/O failures drop the connection; the next tick reconnects

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use registry_core::ServerRecord;
use registry_protocol::{HitCounterLog, ServerTreeLog};

use crate::registry::RegistryHandle;

/// Timeout for connecting to and writing to the logger.
const LOGGER_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// State captured by the registry actor for one telemetry tick.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    /// Lookups handled since the previous snapshot
    pub lookups: u64,

    /// Every registered server, rooms included
    pub servers: Vec<ServerRecord>,

    pub taken_at: DateTime<Utc>,
}

/// Builds and delivers telemetry payloads.
pub struct TelemetryReporter {
    /// Registry instance name stamped on every payload
    name: String,

    /// Remote logger, if any
    logger_addr: Option<String>,

    /// Lazily opened logger connection
    stream: Option<TcpStream>,
}

impl TelemetryReporter {
    pub fn new(name: impl Into<String>, logger_addr: Option<String>) -> Self {
        Self {
            name: name.into(),
            logger_addr,
            stream: None,
        }
    }

    /// Converts a snapshot into the two telemetry payloads.
    pub fn payloads(&self, snapshot: TelemetrySnapshot) -> (HitCounterLog, ServerTreeLog) {
        (
            HitCounterLog::new(&self.name, snapshot.lookups),
            ServerTreeLog::new(&self.name, snapshot.servers),
        )
    }

    /// Emits one snapshot to the log and, if configured, to the logger.
    pub async fn report(&mut self, snapshot: TelemetrySnapshot) {
        let taken_at = snapshot.taken_at;
        let (hits, tree) = self.payloads(snapshot);

        let ready = tree.servers.iter().filter(|s| s.is_ready()).count();
        info!(
            hits = hits.hits,
            servers = tree.servers.len(),
            ready,
            taken_at = %taken_at.to_rfc3339(),
            "Registry telemetry"
        );

        if self.logger_addr.is_none() {
            return;
        }

        let mut buf = Vec::new();
        for payload in [serde_json::to_vec(&hits), serde_json::to_vec(&tree)] {
            match payload {
                Ok(bytes) => {
                    buf.extend_from_slice(&bytes);
                    buf.push(b'\n');
                }
                Err(e) => {
                    warn!(error = %e, "Failed to serialize telemetry payload");
                    return;
                }
            }
        }

        self.send(&buf).await;
    }

    /// Writes to the logger, connecting first if needed.
    async fn send(&mut self, buf: &[u8]) {
        let Some(addr) = self.logger_addr.as_deref() else {
            return;
        };

        if self.stream.is_none() {
            match timeout(LOGGER_IO_TIMEOUT, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    info!(logger = %addr, "Connected to telemetry logger");
                    self.stream = Some(stream);
                }
                Ok(Err(e)) => {
                    debug!(logger = %addr, error = %e, "Telemetry logger unreachable");
                    return;
                }
                Err(_) => {
                    debug!(logger = %addr, "Telemetry logger connect timed out");
                    return;
                }
            }
        }

        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        let written = timeout(LOGGER_IO_TIMEOUT, async {
            stream.write_all(buf).await?;
            stream.flush().await
        })
        .await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(logger = %addr, error = %e, "Telemetry logger write failed, dropping connection");
                self.stream = None;
            }
            Err(_) => {
                warn!(logger = %addr, "Telemetry logger write timed out, dropping connection");
                self.stream = None;
            }
        }
    }

    /// Returns true if a logger connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Spawns the telemetry task.
///
/// Uses cooperative shutdown via CancellationToken. The task also stops if
/// the registry actor goes away.
pub fn spawn_telemetry_task(
    registry: RegistryHandle,
    mut reporter: TelemetryReporter,
    period: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately; skip it so the first report
        // covers a full period.
        tick.tick().await;

        info!(interval_ms = period.as_millis() as u64, "Telemetry task started");

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    info!("Telemetry task shutting down");
                    break;
                }

                _ = tick.tick() => {
                    let Some(snapshot) = registry.take_telemetry().await else {
                        debug!("Telemetry task stopping: registry channel closed");
                        break;
                    };
                    reporter.report(snapshot).await;
                }
            }
        }

        debug!("Telemetry task completed");
    })
}
