//! Match session protocol
//!
//! `SessionProtocol` drives one client's side of a match: room creation
//! and joining, turn alternation, move relay, win-claim arbitration,
//! rematches and exit. Local calls come from the UI; inbound frames come
//! from the supervisor's drain. Outbound messages go through a
//! [`MessageSink`] passed to each call, so the protocol never owns the
//! connection.
//!
//! Move legality is cooperative: each client trusts its own turn flag and
//! the peer's claims.

use crate::event::SessionEvent;
use bingo_bridge::{Channel, Inbound, MessageSink, NetworkMessage, RoomStatus, decode};
use bingo_core::{BingoError, Grid, Position, Result, Role, Side, TurnOwner};
use tracing::{debug, error, info, warn};

/// How a concluded match ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Winner(String),
    /// Both sides claimed the win
    Draw,
}

/// Protocol state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No room
    Idle,
    /// Create request sent, waiting for the room code
    AwaitingRoomCreated,
    /// In a room, waiting for `game-ready`
    AwaitingOpponent,
    /// Match started, no move yet
    Ready,
    /// Moves are being exchanged
    MoveExchange,
    /// Someone won, or both did
    Concluded(Outcome),
}

/// Per-room state. Exists from a create/join request until exit.
#[derive(Debug, Clone)]
pub struct Session {
    room_code: String,
    role: Role,
    local_name: String,
    peer_name: Option<String>,
    turn: TurnOwner,
    last_marked: Option<Position>,
    winner: Option<String>,
    win_claims: u32,
}

impl Session {
    fn new(role: Role, local_name: String, room_code: String) -> Self {
        Self {
            room_code,
            role,
            local_name,
            peer_name: None,
            turn: TurnOwner::Remote,
            last_marked: None,
            winner: None,
            win_claims: 0,
        }
    }

    /// Room code; empty until the relay assigns one
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    pub fn turn(&self) -> TurnOwner {
        self.turn
    }

    pub fn last_marked(&self) -> Option<Position> {
        self.last_marked
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Win claims seen this match, ours and the peer's
    pub fn win_claims(&self) -> u32 {
        self.win_claims
    }

    /// Relay messages name the side that should receive them
    fn relay(&self, channel: Channel, app_version: &str) -> NetworkMessage {
        NetworkMessage::relay(channel, &self.room_code, !self.role.is_creator(), app_version)
    }
}

/// The session state machine
pub struct SessionProtocol {
    phase: Phase,
    session: Option<Session>,
    grid: Grid,
    app_version: String,
    events: Vec<SessionEvent>,
}

impl SessionProtocol {
    pub fn new(app_version: impl Into<String>) -> Self {
        Self {
            phase: Phase::Idle,
            session: None,
            grid: Grid::new(),
            app_version: app_version.into(),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Whether the match has started (`game-ready` seen)
    pub fn room_ready(&self) -> bool {
        matches!(
            self.phase,
            Phase::Ready | Phase::MoveExchange | Phase::Concluded(_)
        )
    }

    /// Room state as the supervisor sees it
    pub fn room_status(&self) -> RoomStatus {
        match self.phase {
            Phase::Idle => RoomStatus::None,
            Phase::AwaitingRoomCreated | Phase::AwaitingOpponent => RoomStatus::Pending,
            _ => RoomStatus::Ready,
        }
    }

    /// Take every notification emitted since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ask the relay for a new room with us as creator
    pub fn create_room<S>(&mut self, sink: &mut S, name: &str) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(BingoError::InvalidInput("Please enter your name".into()));
        }
        self.require_idle()?;
        if !sink.is_connected() {
            return Err(BingoError::NotConnected);
        }

        sink.send_message(&NetworkMessage::create_room(name, &self.app_version))?;

        info!("Creating room as {}", name);
        self.session = Some(Session::new(Role::Creator, name.to_string(), String::new()));
        self.phase = Phase::AwaitingRoomCreated;
        Ok(())
    }

    /// Join an existing room by code
    pub fn join_room<S>(&mut self, sink: &mut S, code: &str, name: &str) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        let (code, name) = (code.trim(), name.trim());
        if code.is_empty() || name.is_empty() {
            return Err(BingoError::InvalidInput(
                "Please enter all required details".into(),
            ));
        }
        self.require_idle()?;
        if !sink.is_connected() {
            return Err(BingoError::NotConnected);
        }

        sink.send_message(&NetworkMessage::join_room(code, name, &self.app_version))?;

        info!("Joining room {} as {}", code, name);
        self.session = Some(Session::new(
            Role::Joiner,
            name.to_string(),
            code.to_string(),
        ));
        self.phase = Phase::AwaitingOpponent;
        Ok(())
    }

    /// Play the cell at `pos`.
    ///
    /// Returns `Ok(false)` without doing anything when it is not our
    /// turn, the match is decided, or the cell is already marked.
    pub fn submit_move<S>(&mut self, sink: &mut S, pos: Position) -> Result<bool>
    where
        S: MessageSink + ?Sized,
    {
        let Some(session) = self.session.as_ref() else {
            return Ok(false);
        };
        if !matches!(self.phase, Phase::Ready | Phase::MoveExchange)
            || session.turn != TurnOwner::Local
            || session.winner.is_some()
        {
            return Ok(false);
        }
        let Some(call_number) = self.grid.cell(pos).filter(|&value| value != 0) else {
            return Ok(false);
        };

        let msg = NetworkMessage::game_on(
            &session.room_code,
            call_number,
            !session.role.is_creator(),
            &self.app_version,
        );
        sink.send_message(&msg)?;

        debug!("Played {} at {}", call_number, pos);
        self.apply_mark(pos, Side::Local);
        self.evaluate_win(sink)?;
        Ok(true)
    }

    /// Start a rematch after a win or draw; we move first.
    ///
    /// Returns `Ok(false)` when no match has concluded.
    pub fn request_retry<S>(&mut self, sink: &mut S) -> Result<bool>
    where
        S: MessageSink + ?Sized,
    {
        let Some(session) = self.session.as_ref() else {
            return Ok(false);
        };
        if session.winner.is_none() {
            return Ok(false);
        }

        sink.send_message(&session.relay(Channel::Retry, &self.app_version))?;
        self.reset_match(TurnOwner::Local);
        Ok(true)
    }

    /// Leave the room. Send failures are ignored.
    pub fn request_exit<S>(&mut self, sink: &mut S)
    where
        S: MessageSink + ?Sized,
    {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let msg = session.relay(Channel::ExitRoom, &self.app_version);
        if let Err(e) = sink.send_message(&msg) {
            debug!("Ignoring exit-room send failure: {}", e);
        }
        self.leave_room();
    }

    /// The transport dropped while in a room
    pub fn handle_implicit_exit(&mut self) {
        if self.session.is_some() {
            info!("Room lost with the connection");
            self.leave_room();
        }
    }

    /// Decode and dispatch one inbound text frame
    pub fn handle_frame<S>(&mut self, sink: &mut S, text: &str) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        let inbound = decode(text).map_err(|e| {
            error!("Failed to parse message: {}", e);
            e
        })?;
        self.handle_inbound(sink, inbound)
    }

    /// Dispatch one decoded inbound message
    pub fn handle_inbound<S>(&mut self, sink: &mut S, inbound: Inbound) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        match inbound {
            Inbound::RoomCreated { room_code, .. } => self.on_room_created(room_code),
            Inbound::JoinAcknowledged { room_code } => {
                debug!("Join acknowledged for room {}", room_code);
            }
            Inbound::GameReady {
                peer_name,
                room_code,
            } => self.on_game_ready(peer_name, room_code),
            Inbound::Move { call_number } => return self.on_move(sink, call_number),
            Inbound::WinClaim { .. } => self.on_win_claim(),
            Inbound::Retry { .. } => self.on_retry(),
            Inbound::ExitRoom => {
                if self.session.is_some() {
                    info!("Opponent left the room");
                    self.leave_room();
                }
            }
            Inbound::Error { message } => {
                warn!("Relay reported error: {}", message);
                self.events
                    .push(SessionEvent::Error(BingoError::Server(message)));
            }
            Inbound::Unknown { channel } => {
                warn!("Unhandled channel: {}", channel);
            }
        }
        Ok(())
    }

    fn require_idle(&self) -> Result<()> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(BingoError::InvalidInput("Already in a room".into()))
        }
    }

    fn on_room_created(&mut self, room_code: String) {
        let Some(session) = self.session.as_mut() else {
            warn!("Room {} created but no room was requested", room_code);
            return;
        };
        if self.phase != Phase::AwaitingRoomCreated {
            warn!("Ignoring room code {} in phase {:?}", room_code, self.phase);
            return;
        }

        info!("Room code = {}", room_code);
        session.room_code = room_code.clone();
        self.phase = Phase::AwaitingOpponent;
        self.events.push(SessionEvent::RoomCreated { room_code });
    }

    fn on_game_ready(&mut self, peer_name: String, room_code: String) {
        let Some(session) = self.session.as_mut() else {
            warn!("game-ready outside a room");
            return;
        };
        if self.phase != Phase::AwaitingOpponent {
            warn!("Ignoring game-ready in phase {:?}", self.phase);
            return;
        }

        if !room_code.is_empty() {
            session.room_code = room_code;
        }

        // The creator is always (1), the joiner (2)
        let mut peer = peer_name;
        if peer == session.local_name {
            let (creator_tag, joiner_tag) = (" (1)", " (2)");
            let (local_tag, peer_tag) = match session.role {
                Role::Creator => (creator_tag, joiner_tag),
                Role::Joiner => (joiner_tag, creator_tag),
            };
            peer.push_str(peer_tag);
            session.local_name.push_str(local_tag);
        }
        session.peer_name = Some(peer.clone());

        let am_creator = session.role.is_creator();
        session.turn = if am_creator {
            TurnOwner::Local
        } else {
            TurnOwner::Remote
        };
        session.last_marked = None;
        session.winner = None;
        session.win_claims = 0;

        self.grid.populate();
        self.phase = Phase::Ready;
        info!("Game is ready against {} in room {}", peer, session.room_code);

        self.events.push(SessionEvent::GameReady {
            peer_name: peer,
            room_code: session.room_code.clone(),
            am_creator,
            first_turn: session.turn,
        });
    }

    fn on_move<S>(&mut self, sink: &mut S, call_number: u8) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        if !self.room_ready() {
            warn!("Ignoring move {} in phase {:?}", call_number, self.phase);
            return Ok(());
        }

        let pos = self.grid.locate(call_number).map_err(|e| {
            error!("Peers out of sync: {}", e);
            e
        })?;
        debug!("Opponent played {} at {}", call_number, pos);
        self.apply_mark(pos, Side::Remote);
        self.evaluate_win(sink)
    }

    fn on_win_claim(&mut self) {
        if !self.room_ready() {
            warn!("Ignoring win-claim in phase {:?}", self.phase);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.win_claims += 1;
        session.winner = Some(
            session
                .peer_name
                .clone()
                .unwrap_or_else(|| "Opponent".to_string()),
        );
        info!("Opponent claims the win ({} claims)", session.win_claims);
        self.conclude(false);
    }

    fn on_retry(&mut self) {
        let decided = self
            .session
            .as_ref()
            .is_some_and(|session| session.winner.is_some());
        if decided {
            self.reset_match(TurnOwner::Remote);
        } else {
            debug!("Ignoring retry while the match is undecided");
        }
    }

    fn apply_mark(&mut self, pos: Position, by: Side) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(call_number) = self.grid.mark(pos) else {
            return;
        };

        let previous = session.last_marked.replace(pos);
        session.turn = by.other();
        if !matches!(self.phase, Phase::Concluded(_)) {
            self.phase = Phase::MoveExchange;
        }

        self.events.push(SessionEvent::MoveApplied {
            position: pos,
            call_number,
            marked_by: by,
            previous,
            markers: self.grid.markers(),
        });
    }

    /// Claim the win once enough lines are complete, at most once per match
    fn evaluate_win<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: MessageSink + ?Sized,
    {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.winner.is_some() || !self.grid.has_won() {
            return Ok(());
        }

        session.win_claims += 1;
        session.winner = Some(session.local_name.clone());
        info!(
            "{} complete lines, claiming the win",
            self.grid.count_complete_lines()
        );

        let msg = session.relay(Channel::WinClaim, &self.app_version);
        self.conclude(true);
        sink.send_message(&msg)
    }

    /// Record the outcome after a claim; two claims make a draw
    fn conclude(&mut self, local_won: bool) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        if session.win_claims > 1 {
            info!("Both sides claimed the win, it's a draw");
            self.phase = Phase::Concluded(Outcome::Draw);
            self.events.push(SessionEvent::DrawDeclared);
        } else {
            let winner = session.winner.clone().unwrap_or_default();
            info!("Winner is {}", winner);
            self.phase = Phase::Concluded(Outcome::Winner(winner.clone()));
            self.events.push(SessionEvent::WinDeclared { winner, local_won });
        }
    }

    fn reset_match(&mut self, next_turn: TurnOwner) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.grid.populate();
        session.winner = None;
        session.win_claims = 0;
        session.last_marked = None;
        session.turn = next_turn;
        self.phase = Phase::Ready;
        info!("Rematch started, {:?} side moves first", next_turn);

        self.events.push(SessionEvent::RetryApplied { next_turn });
    }

    fn leave_room(&mut self) {
        self.session = None;
        self.phase = Phase::Idle;
        self.events.push(SessionEvent::RoomExited);
    }
}
