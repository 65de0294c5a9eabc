//! Two-stage decoding: peek at the header action, then decode the payload.
//!
//! An unknown action is not an error. Decoders return `Ok(None)` so the
//! caller can drop the line without treating it as malformed.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::message::{action, Header, Lookup, RoomEvent, ServerEvent};

/// Partial view of any message: just enough to read the action tag.
#[derive(Debug, Clone, Deserialize)]
pub struct Packet {
    pub header: Header,
}

impl Packet {
    /// Returns the action tag.
    pub fn action(&self) -> &str {
        &self.header.action
    }
}

/// Errors raised while decoding a line.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// The line is not JSON or has no `header.action`.
    #[error("malformed envelope: {0}")]
    Envelope(String),

    /// The action is known but the payload does not match it.
    #[error("malformed {action} payload: {reason}")]
    Payload { action: String, reason: String },
}

/// Reads the action tag from a raw line without decoding the payload.
pub fn peek_action(line: &str) -> Result<String, ProtocolError> {
    let packet: Packet =
        serde_json::from_str(line).map_err(|e| ProtocolError::Envelope(e.to_string()))?;
    Ok(packet.action().to_owned())
}

fn decode_payload<T: DeserializeOwned>(line: &str, action: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(line).map_err(|e| ProtocolError::Payload {
        action: action.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Connector Channel
// ============================================================================

/// Events accepted on the connector channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorEvent {
    Server(ServerEvent),
    Room(RoomEvent),
}

impl ConnectorEvent {
    /// Decodes a connector line.
    ///
    /// Returns `Ok(None)` for actions this channel does not handle.
    pub fn decode(line: &str) -> Result<Option<Self>, ProtocolError> {
        let tag = peek_action(line)?;
        match tag.as_str() {
            action::SERVER_EVENT => decode_payload(line, &tag).map(|e| Some(Self::Server(e))),
            action::ROOM_EVENT => decode_payload(line, &tag).map(|e| Some(Self::Room(e))),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// Client Channel
// ============================================================================

/// Requests accepted on the client channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    Lookup(Lookup),
}

impl ClientRequest {
    /// Decodes a client line.
    ///
    /// Returns `Ok(None)` for actions this channel does not handle.
    pub fn decode(line: &str) -> Result<Option<Self>, ProtocolError> {
        let tag = peek_action(line)?;
        match tag.as_str() {
            action::LOOKUP => decode_payload(line, &tag).map(|l| Some(Self::Lookup(l))),
            _ => Ok(None),
        }
    }
}
