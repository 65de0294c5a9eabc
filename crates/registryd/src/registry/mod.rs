//! Server registry using the Actor pattern.
//!
//! The registry is the single owner of backend server state. It receives
//! commands via a tokio mpsc channel, so connector events and client lookups
//! are serialized without any locking.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Connector conn. │──┐ Apply(Mutation)
//! └─────────────────┘  │                   ┌─────────────────┐
//! ┌─────────────────┐  ├──────────────────▶│  RegistryActor  │
//! │  Client conn.   │──┤ Lookup            │                 │
//! └─────────────────┘  │                   │ BTreeMap<name,  │
//! ┌─────────────────┐  │                   │   ServerRecord> │
//! │ Telemetry task  │──┘ TakeTelemetry     └─────────────────┘
//! └─────────────────┘
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 256;

/// Spawn the registry actor and return a handle for interaction.
///
/// The selection fallback draws from an entropy-seeded generator.
///
/// # Example
///
/// ```no_run
/// use registryd::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry();
///     let servers = handle.servers().await;
/// }
/// ```
pub fn spawn_registry() -> RegistryHandle {
    spawn_registry_with_rng(StdRng::from_entropy())
}

/// Spawn the registry actor with a caller-supplied random source.
///
/// Tests use a seeded generator here to make the random fallback
/// reproducible.
pub fn spawn_registry_with_rng(rng: StdRng) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx, rng);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
