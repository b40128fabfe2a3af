//! # bingo-session
//!
//! Match session protocol for the bingo client.
//!
//! This crate provides:
//! - `SessionProtocol`, the room and match state machine
//! - `MatchClient`, which ties the protocol to a `ConnectionSupervisor`
//!   and drives both from a periodic tick
//! - `SessionEvent` notifications for the presentation layer

pub mod client;
pub mod event;
pub mod session;

pub use client::MatchClient;
pub use event::SessionEvent;
pub use session::{Outcome, Phase, Session, SessionProtocol};
