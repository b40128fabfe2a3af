//! Room roles and turn ownership

use serde::{Deserialize, Serialize};

/// Which side of the room this client is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Created the room and moves first
    Creator,
    /// Joined an existing room by code
    Joiner,
}

impl Role {
    pub fn is_creator(self) -> bool {
        matches!(self, Role::Creator)
    }
}

/// One of the two participants, relative to this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    /// The opposite side
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

/// Side currently permitted to submit the next move
pub type TurnOwner = Side;
