//! Match client
//!
//! Wires one [`ConnectionSupervisor`] to one [`SessionProtocol`] and runs
//! them from a single periodic tick. Everything observable comes back from
//! [`MatchClient::tick`] as [`SessionEvent`]s in the order it happened.

use crate::event::SessionEvent;
use crate::session::{Phase, Session, SessionProtocol};
use bingo_bridge::{
    ConnectionConfig, ConnectionSupervisor, Connector, ReconnectState, ServerTarget,
    SupervisorEvent,
};
use bingo_core::{BingoError, CELL_COUNT, Grid, Position, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// One player's connection and match state
pub struct MatchClient {
    supervisor: ConnectionSupervisor,
    protocol: SessionProtocol,
}

impl MatchClient {
    /// Create a client; connection tasks are spawned on `runtime`
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>, runtime: Handle) -> Self {
        let protocol = SessionProtocol::new(config.app_version.clone());
        Self {
            supervisor: ConnectionSupervisor::new(config, connector, runtime),
            protocol,
        }
    }

    /// Open the relay connection
    pub fn start(&mut self) {
        info!(
            "Connecting to {} relay at {}",
            self.supervisor.config().target,
            self.supervisor.config().url()
        );
        self.supervisor.connect();
    }

    /// Drain transport events, dispatch them, and drive reconnection.
    ///
    /// Inbound failures never escape; they come back as
    /// [`SessionEvent::Error`].
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        // Events from local calls made since the last tick come first
        let mut out = self.protocol.take_events();

        // One transport event at a time, so a close sees the room state left
        // by the frames queued ahead of it
        while let Some(events) = self.supervisor.apply_next(now) {
            for event in events {
                match event {
                    SupervisorEvent::Connected { reconnected } => {
                        out.push(SessionEvent::Connected { reconnected });
                    }
                    SupervisorEvent::Disconnected {
                        code,
                        reason,
                        detail,
                    } => out.push(SessionEvent::Disconnected {
                        code,
                        reason,
                        detail,
                    }),
                    SupervisorEvent::ImplicitExit => self.protocol.handle_implicit_exit(),
                    SupervisorEvent::Frame(text) => {
                        if let Err(e) = self.protocol.handle_frame(&mut self.supervisor, &text) {
                            out.push(SessionEvent::Error(e));
                        }
                    }
                    SupervisorEvent::Error(e) => out.push(SessionEvent::Error(e)),
                }
                out.extend(self.protocol.take_events());
            }
            self.sync_room_status();
        }

        if let Some(SupervisorEvent::Error(e)) = self.supervisor.poll_reconnect(now) {
            out.push(SessionEvent::Error(e));
        }

        out
    }

    pub fn create_room(&mut self, name: &str) -> Result<()> {
        self.protocol.create_room(&mut self.supervisor, name)?;
        self.sync_room_status();
        Ok(())
    }

    pub fn join_room(&mut self, code: &str, name: &str) -> Result<()> {
        self.protocol.join_room(&mut self.supervisor, code, name)?;
        self.sync_room_status();
        Ok(())
    }

    /// Play a cell; `Ok(false)` when the move is not allowed right now
    pub fn submit_move(&mut self, pos: Position) -> Result<bool> {
        self.protocol.submit_move(&mut self.supervisor, pos)
    }

    /// Play the cell holding `call_number`
    pub fn submit_number(&mut self, call_number: u8) -> Result<bool> {
        match self.protocol.grid().locate(call_number) {
            Ok(pos) => self.submit_move(pos),
            // Already marked: a no-op like any other disallowed move
            Err(BingoError::NotFound(n)) if (1..=CELL_COUNT).contains(&usize::from(n)) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn request_retry(&mut self) -> Result<bool> {
        self.protocol.request_retry(&mut self.supervisor)
    }

    pub fn request_exit(&mut self) {
        self.protocol.request_exit(&mut self.supervisor);
        self.sync_room_status();
    }

    /// Leave any room and reconnect to another relay
    pub fn switch_server(&mut self, target: ServerTarget) {
        if self.protocol.session().is_some() {
            debug!("Leaving room before switching relay");
            self.protocol.request_exit(&mut self.supervisor);
            self.sync_room_status();
        }
        self.supervisor.switch_target(target);
    }

    /// Forget earlier reconnection attempts and connect again
    pub fn retry_connection(&mut self) {
        self.supervisor.reset_reconnect();
        self.supervisor.connect();
    }

    /// Leave any room and close the transport
    pub fn shutdown(&mut self) {
        self.protocol.request_exit(&mut self.supervisor);
        self.sync_room_status();
        self.supervisor.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.is_connected()
    }

    pub fn reconnect_state(&self) -> &ReconnectState {
        self.supervisor.reconnect_state()
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.supervisor.config()
    }

    pub fn phase(&self) -> &Phase {
        self.protocol.phase()
    }

    pub fn session(&self) -> Option<&Session> {
        self.protocol.session()
    }

    pub fn grid(&self) -> &Grid {
        self.protocol.grid()
    }

    fn sync_room_status(&mut self) {
        self.supervisor.set_room_status(self.protocol.room_status());
    }
}
