//! Protocol message types for the connector and client channels.

use registry_core::ServerRecord;
use serde::{Deserialize, Serialize};

/// Action tags carried in every message header.
pub mod action {
    /// Server status event (connector channel).
    pub const SERVER_EVENT: &str = "registry.server";
    /// Room status event (connector channel).
    pub const ROOM_EVENT: &str = "registry.room";
    /// Room lookup request (client channel).
    pub const LOOKUP: &str = "registry.lookup";
    /// Lookup response (client channel).
    pub const INDEX: &str = "registry.index";
}

/// Common envelope header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub action: String,
}

impl Header {
    /// Creates a header for the given action tag.
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
        }
    }
}

// ============================================================================
// Connector Channel
// ============================================================================

/// Liveness and capacity status of a backend server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerStatus {
    Up,
    Down,
    Full,
    Ready,

    /// Unrecognised status string
    #[serde(other)]
    Unknown,
}

/// Population status of a room on a backend server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomStatus {
    Populated,
    Depleted,

    /// Unrecognised status string
    #[serde(other)]
    Unknown,
}

/// Server status event, tagged `registry.server`.
///
/// Only `UP` events need an address; other statuses may omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub header: Header,
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub status: Option<ServerStatus>,
}

impl ServerEvent {
    /// Creates a server event without an address.
    pub fn new(name: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            header: Header::new(action::SERVER_EVENT),
            name: name.into(),
            ip: String::new(),
            port: 0,
            status: Some(status),
        }
    }

    /// Sets the announced address.
    pub fn with_address(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.ip = ip.into();
        self.port = port;
        self
    }
}

/// Room status event, tagged `registry.room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub header: Header,
    pub server: String,
    pub room: String,
    #[serde(default)]
    pub status: Option<RoomStatus>,
}

impl RoomEvent {
    /// Creates a room event for `room` on `server`.
    pub fn new(server: impl Into<String>, room: impl Into<String>, status: RoomStatus) -> Self {
        Self {
            header: Header::new(action::ROOM_EVENT),
            server: server.into(),
            room: room.into(),
            status: Some(status),
        }
    }
}

// ============================================================================
// Client Channel
// ============================================================================

/// Request for the best server to host `room`, tagged `registry.lookup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub header: Header,
    #[serde(default)]
    pub room: String,
}

impl Lookup {
    /// Creates a lookup for the given room.
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            header: Header::new(action::LOOKUP),
            room: room.into(),
        }
    }
}

/// Lookup response, tagged `registry.index`.
///
/// Either names a server (`full == false`) or signals that no server is
/// available (`full == true`, all other fields absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub full: bool,
}

impl Index {
    /// Creates a response naming the selected server.
    pub fn from_server(server: &ServerRecord) -> Self {
        Self {
            header: Header::new(action::INDEX),
            name: Some(server.name.clone()),
            ip: Some(server.address.ip.clone()),
            port: Some(server.address.port),
            full: false,
        }
    }

    /// Creates the "no server available" response.
    pub fn unavailable() -> Self {
        Self {
            header: Header::new(action::INDEX),
            name: None,
            ip: None,
            port: None,
            full: true,
        }
    }
}
