//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` is a cheap-to-clone interface shared by the
//! connector listener, the client listener and the telemetry task.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::{mpsc, oneshot};

use registry_core::{Mutation, RoomRecord, ServerAddress, ServerRecord};

use super::commands::{RegistryCommand, RegistryError};
use crate::telemetry::TelemetrySnapshot;

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// # Usage
///
/// ```ignore
/// let handle = registry_handle.clone();
///
/// handle.add_server("chat-1", ServerAddress::new("10.0.0.5", 6767)).await?;
/// handle.add_room("chat-1", "lobby").await?;
///
/// let server = handle.lookup("lobby").await?;
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Queue a state mutation.
    ///
    /// Mutations are applied in the order they are sent; this call returns
    /// once the command is queued, not once it is applied.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn apply(&self, mutation: Mutation) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryCommand::Apply(mutation))
            .await
            .map_err(|_| RegistryError::ChannelClosed)
    }

    /// Register (or re-register) a ready server with no rooms.
    pub async fn add_server(
        &self,
        name: impl Into<String>,
        address: ServerAddress,
    ) -> Result<(), RegistryError> {
        self.apply(Mutation::AddServer(ServerRecord::new(name, address)))
            .await
    }

    pub async fn remove_server(&self, name: impl Into<String>) -> Result<(), RegistryError> {
        self.apply(Mutation::RemoveServer { name: name.into() })
            .await
    }

    /// Mark a server full (`true`) or ready (`false`).
    pub async fn set_full(&self, name: impl Into<String>, full: bool) -> Result<(), RegistryError> {
        self.apply(Mutation::SetFull {
            name: name.into(),
            full,
        })
        .await
    }

    /// Start tracking a room on a server, resetting its hit count.
    pub async fn add_room(
        &self,
        server: impl Into<String>,
        room: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.apply(Mutation::AddRoom {
            server: server.into(),
            room: RoomRecord::new(room),
        })
        .await
    }

    pub async fn remove_room(
        &self,
        server: impl Into<String>,
        room: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.apply(Mutation::RemoveRoom {
            server: server.into(),
            room: room.into(),
        })
        .await
    }

    /// Forget every server.
    pub async fn clear(&self) -> Result<(), RegistryError> {
        self.apply(Mutation::Clear).await
    }

    /// Select a server for `room`.
    ///
    /// The returned record is a snapshot taken right after the room's hit
    /// counter was bumped.
    ///
    /// # Errors
    ///
    /// - `RegistryError::NoServersFound` if every server is full or none exist
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn lookup(&self, room: impl Into<String>) -> Result<ServerRecord, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Lookup {
                room: room.into(),
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await
            .map_err(|_| RegistryError::ChannelClosed)?
            .map_err(RegistryError::from)
    }

    /// Get every registered server.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn servers(&self) -> Vec<ServerRecord> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::GetServers { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Get every server that is not full.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn ready_servers(&self) -> Vec<ServerRecord> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::GetReadyServers { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Read and reset the lookup counter, along with the current server tree.
    ///
    /// Returns `None` if the actor has shut down.
    pub async fn take_telemetry(&self) -> Option<TelemetrySnapshot> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::TakeTelemetry { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Check if the actor is still running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_core::NoServersFound;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (RegistryHandle::new(cmd_tx), cmd_rx)
    }

    #[tokio::test]
    async fn test_add_server_sends_mutation() {
        let (handle, mut rx) = create_test_handle();

        handle
            .add_server("chat-1", ServerAddress::new("localhost", 6767))
            .await
            .unwrap();

        match rx.recv().await {
            Some(RegistryCommand::Apply(Mutation::AddServer(server))) => {
                assert_eq!(server.name, "chat-1");
                assert!(!server.full);
                assert!(server.rooms.is_empty());
            }
            other => panic!("Expected AddServer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_room_resets_hits() {
        let (handle, mut rx) = create_test_handle();

        handle.add_room("chat-1", "lobby").await.unwrap();

        match rx.recv().await {
            Some(RegistryCommand::Apply(Mutation::AddRoom { server, room })) => {
                assert_eq!(server, "chat-1");
                assert_eq!(room.name, "lobby");
                assert_eq!(room.hits, 0);
            }
            other => panic!("Expected AddRoom, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_round_trip() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Lookup { room, respond_to }) = rx.recv().await {
                assert_eq!(room, "lobby");
                let server = ServerRecord::new("chat-1", ServerAddress::new("localhost", 6767));
                let _ = respond_to.send(Ok(server));
                return true;
            }
            false
        });

        let server = handle.lookup("lobby").await.unwrap();
        assert_eq!(server.name, "chat-1");
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_no_servers() {
        let (handle, mut rx) = create_test_handle();

        tokio::spawn(async move {
            if let Some(RegistryCommand::Lookup { respond_to, .. }) = rx.recv().await {
                let _ = respond_to.send(Err(NoServersFound));
            }
        });

        let result = handle.lookup("lobby").await;
        assert!(matches!(result, Err(RegistryError::NoServersFound(_))));
    }

    #[tokio::test]
    async fn test_mutation_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.remove_server("chat-1").await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_lookup_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.lookup("lobby").await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_queries_degrade_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(handle.servers().await.is_empty());
        assert!(handle.ready_servers().await.is_empty());
        assert!(handle.take_telemetry().await.is_none());
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        assert!(!handle.is_connected());
    }
}
