//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations

use registry_core::{Mutation, NoServersFound, ServerRecord};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::telemetry::TelemetrySnapshot;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Mutations are fire-and-forget; queries carry a oneshot channel for the
/// response.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Apply a state mutation (server up/down/full/ready, room changes, clear).
    Apply(Mutation),

    /// Select the best ready server for a room.
    ///
    /// Counts towards the lookup counter whatever the outcome.
    Lookup {
        /// Room the client wants to join
        room: String,
        /// Channel to send the selected server
        respond_to: oneshot::Sender<Result<ServerRecord, NoServersFound>>,
    },

    /// Get every registered server.
    GetServers {
        respond_to: oneshot::Sender<Vec<ServerRecord>>,
    },

    /// Get every server that is not full.
    GetReadyServers {
        respond_to: oneshot::Sender<Vec<ServerRecord>>,
    },

    /// Read the lookup counter and server tree, resetting the counter.
    TakeTelemetry {
        respond_to: oneshot::Sender<TelemetrySnapshot>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors returned by `RegistryHandle` operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Selection found no ready server.
    #[error(transparent)]
    NoServersFound(#[from] NoServersFound),

    /// The actor has shut down.
    #[error("response channel closed")]
    ChannelClosed,
}
