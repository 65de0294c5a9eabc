//! Server and room records tracked by the registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Server Address
// ============================================================================

/// Network location of a backend server.
///
/// Opaque to the registry: it is stored as announced and copied verbatim
/// into lookup responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ServerAddress {
    pub ip: String,
    pub port: u16,
}

impl ServerAddress {
    /// Creates a new address from host and port.
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

// ============================================================================
// Room Record
// ============================================================================

/// Per-server tracking of a room and how often it has been selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub name: String,
    pub hits: u32,
}

impl RoomRecord {
    /// Creates a fresh room record with zero hits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: 0,
        }
    }

    /// Records one selection of this room, wrapping to 0 past `u32::MAX`.
    pub fn hit(&mut self) {
        self.hits = self.hits.wrapping_add(1);
    }
}

// ============================================================================
// Server Record
// ============================================================================

/// A backend server announced over the connector channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub name: String,

    #[serde(flatten)]
    pub address: ServerAddress,

    /// Capacity flag; full servers are never handed out by selection.
    pub full: bool,

    /// Rooms currently populated on this server, keyed by room name.
    pub rooms: HashMap<String, RoomRecord>,
}

impl ServerRecord {
    /// Creates a new, non-full server with no rooms.
    pub fn new(name: impl Into<String>, address: ServerAddress) -> Self {
        Self {
            name: name.into(),
            address,
            full: false,
            rooms: HashMap::new(),
        }
    }

    /// Returns true if this server is accepting new rooms.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.full
    }

    /// Returns the record for `room`, if this server tracks it.
    pub fn room(&self, room: &str) -> Option<&RoomRecord> {
        self.rooms.get(room)
    }
}
