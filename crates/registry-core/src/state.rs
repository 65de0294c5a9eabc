//! Registry state: the mapping of server name to server record.
//!
//! Every operation here is total. Mutations that reference an unknown
//! server or room are silent no-ops, matching an eventually consistent view
//! of an upstream that may be stale.

use std::collections::BTreeMap;

use tracing::debug;

use crate::server::{RoomRecord, ServerRecord};

// ============================================================================
// Mutations
// ============================================================================

/// A single change to registry state.
///
/// Connector events are mapped to these values before being applied, which
/// keeps the event-to-mutation routing a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert a server, replacing any existing record with the same name.
    AddServer(ServerRecord),

    /// Remove a server by name.
    RemoveServer { name: String },

    /// Set the capacity flag of a server.
    SetFull { name: String, full: bool },

    /// Insert a room under a server, replacing any existing room record.
    AddRoom { server: String, room: RoomRecord },

    /// Remove a room from a server.
    RemoveRoom { server: String, room: String },

    /// Drop every server (upstream view lost).
    Clear,
}

// ============================================================================
// Registry State
// ============================================================================

/// All servers known to the registry.
///
/// Servers are kept in name order so the selection scan is deterministic
/// for a given random source.
#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    pub(crate) servers: BTreeMap<String, ServerRecord>,
}

impl RegistryState {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a mutation.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::AddServer(server) => self.add_server(server),
            Mutation::RemoveServer { name } => self.remove_server(&name),
            Mutation::SetFull { name, full } => self.set_full(&name, full),
            Mutation::AddRoom { server, room } => self.add_room(&server, room),
            Mutation::RemoveRoom { server, room } => self.remove_room(&server, &room),
            Mutation::Clear => self.clear(),
        }
    }

    /// Inserts or wholesale replaces a server record.
    pub fn add_server(&mut self, server: ServerRecord) {
        debug!(server = %server.name, address = %server.address, "Server up");
        self.servers.insert(server.name.clone(), server);
    }

    /// Removes a server; no-op if absent.
    pub fn remove_server(&mut self, name: &str) {
        if self.servers.remove(name).is_some() {
            debug!(server = %name, "Server down");
        }
    }

    /// Sets the capacity flag; no-op if the server is unknown.
    pub fn set_full(&mut self, name: &str, full: bool) {
        match self.servers.get_mut(name) {
            Some(server) => server.full = full,
            None => debug!(server = %name, full, "Capacity change for unknown server, ignoring"),
        }
    }

    /// Inserts or replaces a room under a server, resetting its hits.
    pub fn add_room(&mut self, server: &str, room: RoomRecord) {
        match self.servers.get_mut(server) {
            Some(record) => {
                record.rooms.insert(room.name.clone(), room);
            }
            None => debug!(server = %server, room = %room.name, "Room for unknown server, ignoring"),
        }
    }

    /// Removes a room from a server; no-op if either is unknown.
    pub fn remove_room(&mut self, server: &str, room: &str) {
        if let Some(record) = self.servers.get_mut(server) {
            record.rooms.remove(room);
        }
    }

    /// Drops every server record.
    pub fn clear(&mut self) {
        self.servers.clear();
    }

    /// Servers currently accepting new rooms, in name order.
    pub fn ready_servers(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.values().filter(|s| s.is_ready())
    }

    /// All servers, in name order.
    pub fn servers(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.values()
    }

    /// Looks up a server by name.
    pub fn server(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.get(name)
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true if no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
