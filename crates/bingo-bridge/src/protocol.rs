//! Wire protocol for client <-> relay communication
//!
//! Every frame is a JSON object sharing one envelope. Only `channel` is
//! always present; the other fields default when missing.
//! Format: {"channel": "game-on", "res": "", "roomCode": "AB12", ...}

use bingo_core::{BingoError, GRID_SIZE, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Channel tags understood by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    CreateRoom,
    JoinRoom,
    GameReady,
    GameOn,
    WinClaim,
    Retry,
    ExitRoom,
    Error,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::CreateRoom => "create-room",
            Channel::JoinRoom => "join-room",
            Channel::GameReady => "game-ready",
            Channel::GameOn => "game-on",
            Channel::WinClaim => "win-claim",
            Channel::Retry => "retry",
            Channel::ExitRoom => "exit-room",
            Channel::Error => "error",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "create-room" => Channel::CreateRoom,
            "join-room" => Channel::JoinRoom,
            "game-ready" => Channel::GameReady,
            "game-on" => Channel::GameOn,
            "win-claim" => Channel::WinClaim,
            "retry" => Channel::Retry,
            "exit-room" => Channel::ExitRoom,
            "error" => Channel::Error,
            other => {
                return Err(BingoError::Protocol(format!("unknown channel: {}", other)));
            }
        })
    }
}

/// The common frame envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMessage {
    pub channel: String,
    /// Free-form payload: a player name or an error message
    #[serde(default)]
    pub res: String,
    #[serde(default)]
    pub room_code: String,
    #[serde(default)]
    pub dimension: u32,
    /// On relay channels this names the recipient side, not the sender
    #[serde(default)]
    pub is_creator: bool,
    /// Call number of the played cell
    #[serde(default, rename = "move")]
    pub call_number: u32,
    #[serde(default)]
    pub app_version: String,
}

impl NetworkMessage {
    fn new(channel: Channel, app_version: &str) -> Self {
        Self {
            channel: channel.as_str().to_string(),
            dimension: GRID_SIZE as u32,
            app_version: app_version.to_string(),
            ..Default::default()
        }
    }

    /// Ask the relay for a new room
    pub fn create_room(name: &str, app_version: &str) -> Self {
        Self {
            res: name.to_string(),
            is_creator: true,
            ..Self::new(Channel::CreateRoom, app_version)
        }
    }

    /// Ask to join an existing room
    pub fn join_room(room_code: &str, name: &str, app_version: &str) -> Self {
        Self {
            res: name.to_string(),
            room_code: room_code.to_string(),
            is_creator: false,
            ..Self::new(Channel::JoinRoom, app_version)
        }
    }

    /// Build a message relayed to the peer in `room_code`
    pub fn relay(
        channel: Channel,
        room_code: &str,
        recipient_is_creator: bool,
        app_version: &str,
    ) -> Self {
        Self {
            room_code: room_code.to_string(),
            is_creator: recipient_is_creator,
            ..Self::new(channel, app_version)
        }
    }

    /// Relay a move to the peer
    pub fn game_on(
        room_code: &str,
        call_number: u8,
        recipient_is_creator: bool,
        app_version: &str,
    ) -> Self {
        Self {
            call_number: u32::from(call_number),
            ..Self::relay(Channel::GameOn, room_code, recipient_is_creator, app_version)
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Relay assigned a room code to our create request
    RoomCreated { room_code: String, name: String },
    /// Relay acknowledged a join request
    JoinAcknowledged { room_code: String },
    /// Both players are in the room
    GameReady { peer_name: String, room_code: String },
    /// Peer played the cell holding `call_number`
    Move { call_number: u8 },
    /// Peer claims the win
    WinClaim { name: String },
    /// Peer asks for a rematch
    Retry { name: String },
    /// Peer left the room
    ExitRoom,
    /// Server-reported error text
    Error { message: String },
    /// Channel tag this client does not understand
    Unknown { channel: String },
}

impl Inbound {
    fn from_message(msg: NetworkMessage) -> Result<Self> {
        let channel = match msg.channel.parse::<Channel>() {
            Ok(channel) => channel,
            Err(_) => return Ok(Inbound::Unknown { channel: msg.channel }),
        };

        Ok(match channel {
            Channel::CreateRoom => Inbound::RoomCreated {
                room_code: msg.room_code,
                name: msg.res,
            },
            Channel::JoinRoom => Inbound::JoinAcknowledged {
                room_code: msg.room_code,
            },
            Channel::GameReady => Inbound::GameReady {
                peer_name: msg.res,
                room_code: msg.room_code,
            },
            Channel::GameOn => {
                let call_number = u8::try_from(msg.call_number).map_err(|_| {
                    BingoError::Protocol(format!("move out of range: {}", msg.call_number))
                })?;
                Inbound::Move { call_number }
            }
            Channel::WinClaim => Inbound::WinClaim { name: msg.res },
            Channel::Retry => Inbound::Retry { name: msg.res },
            Channel::ExitRoom => Inbound::ExitRoom,
            Channel::Error => Inbound::Error { message: msg.res },
        })
    }
}

/// Serialize a message to a JSON text frame
pub fn encode(msg: &NetworkMessage) -> Result<String> {
    serde_json::to_string(msg).map_err(Into::into)
}

/// Deserialize a JSON text frame
pub fn decode(text: &str) -> Result<Inbound> {
    let msg: NetworkMessage = serde_json::from_str(text)?;
    Inbound::from_message(msg)
}
