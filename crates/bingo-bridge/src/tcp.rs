//! TCP transport implementation
//!
//! Used for relays reachable over plain TCP (`tcp://host:port`). Frames
//! are length-prefixed: 4-byte little-endian length + UTF-8 JSON payload.

use crate::transport::{
    AsyncReader, AsyncWriter, CLOSE_ABNORMAL, CLOSE_NORMAL, Connection, Connector, Frame,
};
use async_trait::async_trait;
use bingo_core::{BingoError, Result};
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::info;

/// Largest accepted frame body (64MB)
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// TCP read wrapper
pub struct TcpReadWrapper(pub OwnedReadHalf);

#[async_trait]
impl AsyncReader for TcpReadWrapper {
    async fn read_frame(&mut self) -> Result<Frame> {
        // Read 4-byte length prefix (little-endian)
        let mut len_bytes = [0u8; 4];
        match self.0.read_exact(&mut len_bytes).await {
            Ok(_) => {}
            // EOF between frames is an orderly close
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Ok(Frame::Close {
                    code: Some(CLOSE_NORMAL),
                    reason: "connection closed".into(),
                });
            }
            Err(e) => {
                return Ok(Frame::Close {
                    code: Some(CLOSE_ABNORMAL),
                    reason: format!("TCP read length failed: {}", e),
                });
            }
        }
        let len = u32::from_le_bytes(len_bytes) as usize;

        // Sanity check on frame size
        if len > MAX_FRAME_LEN {
            return Err(BingoError::Transport(format!(
                "Frame too large: {} bytes",
                len
            )));
        }

        // Read frame body
        let mut data = vec![0u8; len];
        if let Err(e) = self.0.read_exact(&mut data).await {
            return Ok(Frame::Close {
                code: Some(CLOSE_ABNORMAL),
                reason: format!("TCP read data failed: {}", e),
            });
        }

        String::from_utf8(data)
            .map(Frame::Text)
            .map_err(|e| BingoError::Transport(format!("Frame is not UTF-8: {}", e)))
    }
}

/// TCP write wrapper
pub struct TcpWriteWrapper(pub OwnedWriteHalf);

#[async_trait]
impl AsyncWriter for TcpWriteWrapper {
    async fn write_text(&mut self, text: &str) -> Result<()> {
        // Anything larger would be refused by the reading side
        if text.len() > MAX_FRAME_LEN {
            return Err(BingoError::Transport(format!(
                "Frame too large: {} bytes",
                text.len()
            )));
        }

        // Write 4-byte length prefix (little-endian)
        let len = (text.len() as u32).to_le_bytes();
        self.0
            .write_all(&len)
            .await
            .map_err(|e| BingoError::Transport(format!("TCP write length failed: {}", e)))?;

        // Write frame body
        self.0
            .write_all(text.as_bytes())
            .await
            .map_err(|e| BingoError::Transport(format!("TCP write data failed: {}", e)))?;

        // Flush to ensure data is sent
        self.0
            .flush()
            .await
            .map_err(|e| BingoError::Transport(format!("TCP flush failed: {}", e)))?;

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.0
            .shutdown()
            .await
            .map_err(|e| BingoError::Transport(format!("TCP shutdown failed: {}", e)))
    }
}

/// Opens length-prefixed TCP connections
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, url: &str) -> Result<Connection> {
        let addr = url.strip_prefix("tcp://").unwrap_or(url);
        info!("Connecting to relay over TCP at {}", addr);

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| BingoError::Transport(format!("Failed to connect: {}", e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| BingoError::Transport(format!("Failed to set TCP_NODELAY: {}", e)))?;

        let (read_half, write_half) = stream.into_split();
        Ok(Connection {
            reader: Box::new(TcpReadWrapper(read_half)),
            writer: Box::new(TcpWriteWrapper(write_half)),
        })
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}
