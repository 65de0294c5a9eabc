//! Connector event dispatch.
//!
//! Translates decoded connector events into registry mutations. Events with
//! a missing or unrecognised status have no effect.

use tracing::debug;

use registry_core::{Mutation, RoomRecord, ServerAddress, ServerRecord};
use registry_protocol::{ConnectorEvent, RoomEvent, RoomStatus, ServerEvent, ServerStatus};

use crate::registry::{RegistryError, RegistryHandle};

/// Maps a connector event to the state change it implies.
///
/// Returns `None` when the event carries no usable status.
pub fn mutation_for(event: ConnectorEvent) -> Option<Mutation> {
    match event {
        ConnectorEvent::Server(event) => server_mutation(event),
        ConnectorEvent::Room(event) => room_mutation(event),
    }
}

fn server_mutation(event: ServerEvent) -> Option<Mutation> {
    match event.status? {
        ServerStatus::Up => Some(Mutation::AddServer(ServerRecord::new(
            event.name,
            ServerAddress::new(event.ip, event.port),
        ))),
        ServerStatus::Down => Some(Mutation::RemoveServer { name: event.name }),
        ServerStatus::Full => Some(Mutation::SetFull {
            name: event.name,
            full: true,
        }),
        ServerStatus::Ready => Some(Mutation::SetFull {
            name: event.name,
            full: false,
        }),
        ServerStatus::Unknown => None,
    }
}

fn room_mutation(event: RoomEvent) -> Option<Mutation> {
    match event.status? {
        RoomStatus::Populated => Some(Mutation::AddRoom {
            server: event.server,
            room: RoomRecord::new(event.room),
        }),
        RoomStatus::Depleted => Some(Mutation::RemoveRoom {
            server: event.server,
            room: event.room,
        }),
        RoomStatus::Unknown => None,
    }
}

/// Applies connector events to the registry.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: RegistryHandle,
}

impl EventDispatcher {
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry }
    }

    /// Dispatches one event.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the registry actor has shut down
    pub async fn dispatch(&self, event: ConnectorEvent) -> Result<(), RegistryError> {
        let Some(mutation) = mutation_for(event) else {
            debug!("Ignoring connector event without a recognised status");
            return Ok(());
        };

        debug!(?mutation, "Dispatching connector event");
        self.registry.apply(mutation).await
    }

    /// Forgets every server. Called when the connector channel goes away.
    pub async fn connector_lost(&self) -> Result<(), RegistryError> {
        self.registry.clear().await
    }
}
