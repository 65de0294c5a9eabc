//! Registry Core - In-memory server registry and room-aware selection
//!
//! This crate holds the state shared by the registry daemon (registryd)
//! and its wire protocol: server and room records, the mutations that
//! connector events translate into, and the selection heuristic used to
//! answer room lookups.
//!
//! Everything here is synchronous and free of I/O. Ownership of the state
//! (and therefore serialization of access) is the caller's concern; the
//! daemon confines it to a single actor task.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod select;
pub mod server;
pub mod state;

// Re-exports for convenience
pub use error::NoServersFound;
pub use server::{RoomRecord, ServerAddress, ServerRecord};
pub use state::{Mutation, RegistryState};
