//! Notifications for the presentation layer

use bingo_bridge::CloseReason;
use bingo_core::{BingoError, Position, Side, TurnOwner};

/// Something the UI should react to, emitted once per occurrence
#[derive(Debug)]
pub enum SessionEvent {
    /// Transport opened
    Connected { reconnected: bool },
    /// Transport closed
    Disconnected {
        code: Option<u16>,
        reason: CloseReason,
        detail: String,
    },
    /// A failure to surface to the player
    Error(BingoError),
    /// Relay assigned our room a code; waiting for an opponent
    RoomCreated { room_code: String },
    /// Both players are in; the match starts
    GameReady {
        peer_name: String,
        room_code: String,
        am_creator: bool,
        first_turn: TurnOwner,
    },
    /// A cell was marked
    MoveApplied {
        position: Position,
        call_number: u8,
        marked_by: Side,
        /// Last highlighted cell, now settled
        previous: Option<Position>,
        /// Line indicators to light
        markers: usize,
    },
    /// One side won outright
    WinDeclared { winner: String, local_won: bool },
    /// Both sides claimed the win
    DrawDeclared,
    /// A rematch started
    RetryApplied { next_turn: TurnOwner },
    /// The room is gone; leave the match view
    RoomExited,
}
