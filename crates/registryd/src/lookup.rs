//! Client lookup handling.
//!
//! Every lookup gets exactly one `Index` back. When no server can take the
//! room (or the registry is gone) the reply is `Index { full: true }`.

use tracing::{debug, error};

use registry_protocol::{ClientRequest, Index, Lookup};

use crate::registry::{RegistryError, RegistryHandle};

/// Answers client lookups from the registry.
#[derive(Clone)]
pub struct LookupService {
    registry: RegistryHandle,
}

impl LookupService {
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry }
    }

    /// Handles a decoded client request.
    pub async fn handle(&self, request: ClientRequest) -> Index {
        match request {
            ClientRequest::Lookup(lookup) => self.lookup(lookup).await,
        }
    }

    /// Resolves a lookup into the reply sent to the client.
    pub async fn lookup(&self, lookup: Lookup) -> Index {
        match self.registry.lookup(lookup.room.as_str()).await {
            Ok(server) => {
                debug!(room = %lookup.room, server = %server.name, address = %server.address, "Resolved lookup");
                Index::from_server(&server)
            }
            Err(RegistryError::NoServersFound(_)) => {
                debug!(room = %lookup.room, "No ready servers for lookup");
                Index::unavailable()
            }
            Err(e @ RegistryError::ChannelClosed) => {
                error!(room = %lookup.room, error = %e, "Registry unavailable during lookup");
                Index::unavailable()
            }
        }
    }
}
