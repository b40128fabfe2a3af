//! Relay connection infrastructure for the bingo match engine
//!
//! This crate provides:
//! - Wire protocol for the relay's JSON envelope
//! - Transport abstractions (AsyncReader/AsyncWriter/Connector traits)
//! - WebSocket, TCP and in-memory transports
//! - Connection supervision with bounded reconnection and an ordered
//!   per-tick event queue

pub mod config;
pub mod memory;
pub mod protocol;
pub mod supervisor;
pub mod tcp;
pub mod transport;
pub mod websocket;

pub use config::{ConnectionConfig, ServerTarget, TransportKind, connector_for, memory_connector};
pub use memory::{MemoryConnector, MemoryPeer};
pub use protocol::{Channel, Inbound, NetworkMessage, decode, encode};
pub use supervisor::{
    ConnectionSupervisor, MessageSink, ReconnectState, RoomStatus, SupervisorEvent,
};
pub use transport::{AsyncReader, AsyncWriter, CloseReason, Connection, Connector, Frame};
