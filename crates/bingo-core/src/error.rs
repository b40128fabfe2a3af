//! Error types for the bingo match engine

use thiserror::Error;

/// Result type for bingo operations
pub type Result<T> = std::result::Result<T, BingoError>;

/// Bingo error types
#[derive(Debug, Error)]
pub enum BingoError {
    /// Empty name or room code
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Send attempted with no open transport
    #[error("Not connected to server")]
    NotConnected,

    /// Call number is not held by any unmarked cell
    #[error("Call number {0} not found on the grid")]
    NotFound(u8),

    /// Transport closed unexpectedly
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Reconnection ceiling reached
    #[error("Connection failed after {attempts} attempts, server may be down")]
    ReconnectExhausted { attempts: u32 },

    /// Transport-level failure (connect, read, write)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed or unexpected protocol frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the relay server
    #[error("Server error: {0}")]
    Server(String),
}

impl From<serde_json::Error> for BingoError {
    fn from(err: serde_json::Error) -> Self {
        BingoError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BingoError::ReconnectExhausted { attempts: 3 }.to_string(),
            "Connection failed after 3 attempts, server may be down"
        );
        assert_eq!(
            BingoError::NotFound(7).to_string(),
            "Call number 7 not found on the grid"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        match BingoError::from(err) {
            BingoError::Serialization(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Serialization, got {:?}", other),
        }
    }
}
