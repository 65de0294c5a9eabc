//! The single failure signal surfaced by the registry core.

use thiserror::Error;

/// No registered server is currently accepting new rooms.
///
/// Raised by selection when the registry is empty or every server has
/// announced itself full. Callers answering lookups translate this into a
/// normal "full" response rather than a transport fault.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no servers available")]
pub struct NoServersFound;
