//! Registry Daemon - Server directory and room-aware load balancer
//!
//! This crate provides the infrastructure for the registry daemon:
//! - `registry` - Registry actor owning all server and room state
//! - `dispatch` - Connector event to registry mutation routing
//! - `lookup` - Client lookup resolution
//! - `server` - TCP listeners for the connector and client channels
//! - `telemetry` - Periodic hit counter and server tree reports
//! - `config` - Layered daemon configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      registryd daemon                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │ RegistryServer  │────▶│       RegistryActor         │   │
//! │  │ (connector +    │     │  (server state owner,       │   │
//! │  │  client TCP)    │     │   selection, hit counts)    │   │
//! │  └─────────────────┘     └──────────────▲──────────────┘   │
//! │                                         │                   │
//! │                          TakeTelemetry  │                   │
//! │                          ┌──────────────┴──────────────┐   │
//! │                          │      Telemetry task         │──────▶ logger
//! │                          └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod dispatch;
pub mod lookup;
pub mod registry;
pub mod server;
pub mod telemetry;
