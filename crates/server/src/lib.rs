//! Network service for Versant
//!
//! This crate puts the store on the wire:
//! - protocol: the fixed 16-byte packet framing and its codec
//! - registry: bookkeeping of live client connections
//! - service: the per-connection request loop, one transaction per client
//! - server: listener setup and the accept loop
//!
//! The concurrency model is one OS thread per accepted connection; all
//! blocking is on OS primitives (mutexes, condition variables, socket
//! reads), never on a runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod protocol;
pub mod registry;
pub mod server;
pub mod service;

pub use protocol::{recv_packet, send_packet, Packet, PacketType, ReplyStatus};
pub use registry::ClientRegistry;
pub use server::Server;
