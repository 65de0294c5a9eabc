//! Registry actor - owns all registry state and processes commands.
//!
//! The RegistryActor is the single owner of server state in the daemon.
//! Connector events and client lookups both arrive here as commands and are
//! processed strictly one at a time, so no read ever interleaves with a write.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Reply send failures are ignored (the requester went away)

use chrono::Utc;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use registry_core::{Mutation, NoServersFound, RegistryState, ServerRecord};

use super::commands::RegistryCommand;
use crate::telemetry::TelemetrySnapshot;

/// The registry actor - owns all server state.
///
/// # Ownership
///
/// The actor owns:
/// - `state`: every server record and its rooms
/// - `rng`: the random source for the selection fallback
/// - `lookups`: lookups served since the last telemetry tick
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    state: RegistryState,

    rng: StdRng,

    lookups: u64,
}

impl RegistryActor {
    /// Creates a new registry actor.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `rng` - Random source used for the selection fallback
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>, rng: StdRng) -> Self {
        Self {
            receiver,
            state: RegistryState::new(),
            rng,
            lookups: 0,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(servers = self.state.len(), "Registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Apply(mutation) => {
                self.handle_apply(mutation);
            }
            RegistryCommand::Lookup { room, respond_to } => {
                let result = self.handle_lookup(&room);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::GetServers { respond_to } => {
                let _ = respond_to.send(self.state.servers().cloned().collect());
            }
            RegistryCommand::GetReadyServers { respond_to } => {
                let _ = respond_to.send(self.state.ready_servers().cloned().collect());
            }
            RegistryCommand::TakeTelemetry { respond_to } => {
                let _ = respond_to.send(self.handle_take_telemetry());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_apply(&mut self, mutation: Mutation) {
        if matches!(mutation, Mutation::Clear) && !self.state.is_empty() {
            info!(
                servers = self.state.len(),
                "Connector disconnected, clearing all servers"
            );
        }

        self.state.apply(mutation);
    }

    fn handle_lookup(&mut self, room: &str) -> Result<ServerRecord, NoServersFound> {
        self.lookups = self.lookups.wrapping_add(1);

        match self.state.select_server(room, &mut self.rng) {
            Ok(server) => {
                debug!(room = %room, server = %server.name, "Lookup served");
                Ok(server.clone())
            }
            Err(e) => {
                debug!(room = %room, "Lookup found no ready servers");
                Err(e)
            }
        }
    }

    fn handle_take_telemetry(&mut self) -> TelemetrySnapshot {
        let lookups = std::mem::take(&mut self.lookups);
        TelemetrySnapshot {
            lookups,
            servers: self.state.servers().cloned().collect(),
            taken_at: Utc::now(),
        }
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    /// Returns the number of servers currently registered.
    #[cfg(test)]
    pub fn server_count(&self) -> usize {
        self.state.len()
    }
}
