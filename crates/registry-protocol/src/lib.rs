//! Registry Protocol - Wire messages for the room registry
//!
//! Two channels share one envelope: every message is a JSON object with a
//! `header.action` tag, which is read first to route the line before the
//! full payload is decoded.
//!
//! - Connector channel (backend servers → registry): `ServerEvent`, `RoomEvent`
//! - Client channel (clients ↔ registry): `Lookup` in, `Index` out
//! - Telemetry (registry → logger): `HitCounterLog`, `ServerTreeLog`

pub mod log;
pub mod message;
pub mod parse;

pub use log::{HitCounterLog, ServerTreeLog};
pub use message::{
    action, Header, Index, Lookup, RoomEvent, RoomStatus, ServerEvent, ServerStatus,
};
pub use parse::{peek_action, ClientRequest, ConnectorEvent, Packet, ProtocolError};
