//! In-process transport
//!
//! `MemoryConnector` hands each accepted connection's server side to the
//! caller as a [`MemoryPeer`], which can push frames to the client, read
//! what the client sent, and close the link with any close code. The
//! connector can be switched offline to make connect attempts fail.

use crate::protocol::{NetworkMessage, encode};
use crate::transport::{AsyncReader, AsyncWriter, CLOSE_ABNORMAL, Connection, Connector, Frame};
use async_trait::async_trait;
use bingo_core::{BingoError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug)]
struct MemoryState {
    online: bool,
    stalled: bool,
    connects: usize,
    pending: VecDeque<MemoryPeer>,
}

/// Connector whose connections terminate in the same process
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                online: true,
                stalled: false,
                connects: 0,
                pending: VecDeque::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // State stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make future connect attempts succeed or fail
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    /// Make future connect attempts hang until the caller gives up on them
    pub fn set_stalled(&self, stalled: bool) {
        self.lock().stalled = stalled;
    }

    /// Take the server side of the oldest unclaimed connection
    pub fn accept(&self) -> Option<MemoryPeer> {
        self.lock().pending.pop_front()
    }

    /// Number of connect attempts seen so far, successful or not
    pub fn connect_attempts(&self) -> usize {
        self.lock().connects
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Connection> {
        let stalled = {
            let mut state = self.lock();
            state.connects += 1;
            state.stalled
        };
        if stalled {
            debug!("In-memory connect to {} stalled", url);
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        if !state.online {
            return Err(BingoError::Transport(format!(
                "Failed to connect to {}: connection refused",
                url
            )));
        }

        let (to_client, from_server) = mpsc::unbounded_channel();
        let (to_server, from_client) = mpsc::unbounded_channel();
        state.pending.push_back(MemoryPeer {
            to_client,
            from_client,
        });
        debug!("In-memory connection opened to {}", url);

        Ok(Connection {
            reader: Box::new(MemoryReader(from_server)),
            writer: Box::new(MemoryWriter(Some(to_server))),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Client-side reader
struct MemoryReader(mpsc::UnboundedReceiver<Frame>);

#[async_trait]
impl AsyncReader for MemoryReader {
    async fn read_frame(&mut self) -> Result<Frame> {
        Ok(self.0.recv().await.unwrap_or(Frame::Close {
            code: Some(CLOSE_ABNORMAL),
            reason: "peer dropped".into(),
        }))
    }
}

/// Client-side writer. `None` once closed.
struct MemoryWriter(Option<mpsc::UnboundedSender<String>>);

#[async_trait]
impl AsyncWriter for MemoryWriter {
    async fn write_text(&mut self, text: &str) -> Result<()> {
        let tx = self
            .0
            .as_ref()
            .ok_or_else(|| BingoError::Transport("Writer closed".into()))?;
        tx.send(text.to_string())
            .map_err(|_| BingoError::Transport("Peer dropped".into()))
    }

    async fn close(&mut self) -> Result<()> {
        self.0 = None;
        Ok(())
    }
}

/// Server side of an in-memory connection
#[derive(Debug)]
pub struct MemoryPeer {
    to_client: mpsc::UnboundedSender<Frame>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Push a raw text frame to the client
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.to_client
            .send(Frame::Text(text.into()))
            .map_err(|_| BingoError::Transport("Client dropped".into()))
    }

    /// Push a protocol message to the client
    pub fn send(&self, msg: &NetworkMessage) -> Result<()> {
        self.send_text(encode(msg)?)
    }

    /// Close the link with the given close code
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.to_client.send(Frame::Close {
            code: Some(code),
            reason: reason.to_string(),
        });
    }

    /// Stop reading from the client; its writes fail from now on
    pub fn stop_reading(&mut self) {
        self.from_client.close();
    }

    /// Next frame the client sent, if one is waiting
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }

    /// Next frame the client sent, decoded as an envelope
    pub fn try_recv_message(&mut self) -> Option<NetworkMessage> {
        self.try_recv()
            .and_then(|text| serde_json::from_str(&text).ok())
    }

    /// Wait for the next frame the client sends
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }
}
