//! Transport abstractions for the relay connection
//!
//! Provides AsyncReader/AsyncWriter traits that each backend implements
//! (WebSocket, length-prefixed TCP, in-memory), a `Connector` that opens
//! them, and the background reader/writer tasks that turn a live
//! connection into generation-tagged events on the supervisor's queue.

use async_trait::async_trait;
use bingo_core::Result;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// A frame received from the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame carrying one JSON message
    Text(String),
    /// The peer closed the connection
    Close { code: Option<u16>, reason: String },
}

/// Close code for a connection that dropped without a close handshake
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code for an orderly shutdown
pub const CLOSE_NORMAL: u16 = 1000;

/// Trait for async reading from a transport
#[async_trait]
pub trait AsyncReader: Send {
    /// Read the next complete frame
    async fn read_frame(&mut self) -> Result<Frame>;
}

/// Trait for async writing to a transport
#[async_trait]
pub trait AsyncWriter: Send {
    /// Write one text frame
    async fn write_text(&mut self, text: &str) -> Result<()>;

    /// Start an orderly close
    async fn close(&mut self) -> Result<()>;
}

/// Both halves of a freshly opened connection
pub struct Connection {
    pub reader: Box<dyn AsyncReader>,
    pub writer: Box<dyn AsyncWriter>,
}

/// Opens connections for one backend
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`
    async fn connect(&self, url: &str) -> Result<Connection>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Close-code taxonomy used for human-readable disconnect reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    Normal,
    GoingAway,
    ProtocolError,
    UnsupportedData,
    NoStatus,
    Abnormal,
    ServerError,
    TlsHandshakeFailure,
    Other,
}

impl CloseReason {
    /// Classify a close code. A missing code reads as "no status".
    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(1000) => CloseReason::Normal,
            Some(1001) => CloseReason::GoingAway,
            Some(1002) => CloseReason::ProtocolError,
            Some(1003) => CloseReason::UnsupportedData,
            Some(1005) | None => CloseReason::NoStatus,
            Some(1006) => CloseReason::Abnormal,
            Some(1011) => CloseReason::ServerError,
            Some(1015) => CloseReason::TlsHandshakeFailure,
            Some(_) => CloseReason::Other,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CloseReason::Normal => "Normal closure",
            CloseReason::GoingAway => "Server going away",
            CloseReason::ProtocolError => "Protocol error",
            CloseReason::UnsupportedData => "Unsupported data",
            CloseReason::NoStatus => "No status received",
            CloseReason::Abnormal => "Connection lost",
            CloseReason::ServerError => "Internal server error",
            CloseReason::TlsHandshakeFailure => "TLS handshake failure",
            CloseReason::Other => "Connection closed",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Commands for a connection's writer task
#[derive(Debug)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Something that happened on a connection, recorded off the tick thread
#[derive(Debug)]
pub enum TransportEvent {
    /// Connection established; frames for it go through this sender
    Opened(mpsc::UnboundedSender<Outbound>),
    /// Connect attempt failed or timed out
    ConnectFailed(String),
    /// Text frame received
    Message(String),
    /// Read or write failure on a live connection
    Error(String),
    /// Connection closed
    Closed { code: Option<u16>, reason: String },
}

/// An event tagged with the connection generation that produced it
#[derive(Debug)]
pub struct QueuedEvent {
    pub generation: u64,
    pub event: TransportEvent,
}

/// Producer handle onto the supervisor's event queue, bound to one
/// connection generation
#[derive(Debug, Clone)]
pub struct EventQueue {
    generation: u64,
    tx: mpsc::UnboundedSender<QueuedEvent>,
}

impl EventQueue {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<QueuedEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enqueue an event. Returns false once the supervisor is gone.
    pub fn push(&self, event: TransportEvent) -> bool {
        self.tx
            .send(QueuedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Background reader task
///
/// Forwards every inbound frame onto the event queue, in order, and ends
/// after the connection closes or fails.
pub async fn reader_task(mut reader: Box<dyn AsyncReader>, queue: EventQueue) {
    loop {
        match reader.read_frame().await {
            Ok(Frame::Text(text)) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "[Relay→Client] gen={} len={} json={}",
                    queue.generation(),
                    text.len(),
                    preview
                );
                if !queue.push(TransportEvent::Message(text)) {
                    debug!("Event queue closed, reader task exiting");
                    break;
                }
            }
            Ok(Frame::Close { code, reason }) => {
                debug!("Connection closed by peer: code={:?} reason={}", code, reason);
                queue.push(TransportEvent::Closed { code, reason });
                break;
            }
            Err(e) => {
                error!("Reader task failed: {}", e);
                queue.push(TransportEvent::Error(e.to_string()));
                queue.push(TransportEvent::Closed {
                    code: Some(CLOSE_ABNORMAL),
                    reason: e.to_string(),
                });
                break;
            }
        }
    }
}

/// Background writer task
///
/// Writes outbound frames in submission order. Ends when the command
/// channel closes, on a close command, or on the first write failure.
pub async fn writer_task(
    mut writer: Box<dyn AsyncWriter>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    queue: EventQueue,
) {
    while let Some(cmd) = outbound.recv().await {
        match cmd {
            Outbound::Text(text) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "[Client→Relay] gen={} len={} json={}",
                    queue.generation(),
                    text.len(),
                    preview
                );
                if let Err(e) = writer.write_text(&text).await {
                    error!("Failed to send frame: {}", e);
                    queue.push(TransportEvent::Error(format!("Failed to send message: {}", e)));
                    queue.push(TransportEvent::Closed {
                        code: Some(CLOSE_ABNORMAL),
                        reason: e.to_string(),
                    });
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = writer.close().await {
                    warn!("Close handshake failed: {}", e);
                }
                break;
            }
        }
    }
    debug!("Writer task for gen={} exiting", queue.generation());
}

/// Spawn the reader and writer tasks for an open connection.
///
/// The reader is aborted once the writer ends, so retiring a connection
/// (close command, write failure, or dropping its outbound sender) also
/// releases the read half.
pub fn spawn_io_tasks(
    conn: Connection,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    queue: EventQueue,
) {
    let reader = tokio::spawn(reader_task(conn.reader, queue.clone()));
    tokio::spawn(async move {
        let generation = queue.generation();
        writer_task(conn.writer, outbound, queue).await;
        reader.abort();
        debug!("Connection gen={} retired", generation);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_core::BingoError;
    use std::collections::VecDeque;

    struct ScriptedReader(VecDeque<Result<Frame>>);

    #[async_trait]
    impl AsyncReader for ScriptedReader {
        async fn read_frame(&mut self) -> Result<Frame> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Err(BingoError::Transport("script exhausted".into())))
        }
    }

    #[test]
    fn test_close_code_taxonomy() {
        assert_eq!(CloseReason::from_code(Some(1000)), CloseReason::Normal);
        assert_eq!(CloseReason::from_code(Some(1001)), CloseReason::GoingAway);
        assert_eq!(CloseReason::from_code(Some(1002)), CloseReason::ProtocolError);
        assert_eq!(CloseReason::from_code(Some(1003)), CloseReason::UnsupportedData);
        assert_eq!(CloseReason::from_code(Some(1005)), CloseReason::NoStatus);
        assert_eq!(CloseReason::from_code(None), CloseReason::NoStatus);
        assert_eq!(CloseReason::from_code(Some(1006)), CloseReason::Abnormal);
        assert_eq!(CloseReason::from_code(Some(1011)), CloseReason::ServerError);
        assert_eq!(
            CloseReason::from_code(Some(1015)),
            CloseReason::TlsHandshakeFailure
        );
        assert_eq!(CloseReason::from_code(Some(4000)), CloseReason::Other);
        assert_eq!(CloseReason::Abnormal.to_string(), "Connection lost");
    }

    #[tokio::test]
    async fn test_reader_task_preserves_order_and_stops_at_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = ScriptedReader(VecDeque::from(vec![
            Ok(Frame::Text("one".into())),
            Ok(Frame::Text("two".into())),
            Ok(Frame::Close {
                code: Some(1000),
                reason: "bye".into(),
            }),
            Ok(Frame::Text("never".into())),
        ]));

        reader_task(Box::new(reader), EventQueue::new(3, tx)).await;

        let mut seen = Vec::new();
        while let Ok(queued) = rx.try_recv() {
            assert_eq!(queued.generation, 3);
            seen.push(queued.event);
        }
        assert_eq!(seen.len(), 3);
        assert!(matches!(&seen[0], TransportEvent::Message(t) if t == "one"));
        assert!(matches!(&seen[1], TransportEvent::Message(t) if t == "two"));
        assert!(matches!(
            &seen[2],
            TransportEvent::Closed { code: Some(1000), .. }
        ));
    }

    struct FailingWriter;

    #[async_trait]
    impl AsyncWriter for FailingWriter {
        async fn write_text(&mut self, _text: &str) -> Result<()> {
            Err(BingoError::Transport("broken pipe".into()))
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writer_failure_reports_abnormal_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        out_tx.send(Outbound::Text("hello".into())).unwrap();
        out_tx.send(Outbound::Text("never written".into())).unwrap();

        writer_task(Box::new(FailingWriter), out_rx, EventQueue::new(2, tx)).await;

        assert!(matches!(
            rx.try_recv().unwrap().event,
            TransportEvent::Error(msg) if msg.contains("broken pipe")
        ));
        assert!(matches!(
            rx.try_recv().unwrap().event,
            TransportEvent::Closed {
                code: Some(CLOSE_ABNORMAL),
                ..
            }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reader_failure_reports_abnormal_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        reader_task(
            Box::new(ScriptedReader(VecDeque::new())),
            EventQueue::new(1, tx),
        )
        .await;

        assert!(matches!(
            rx.try_recv().unwrap().event,
            TransportEvent::Error(_)
        ));
        assert!(matches!(
            rx.try_recv().unwrap().event,
            TransportEvent::Closed {
                code: Some(CLOSE_ABNORMAL),
                ..
            }
        ));
    }
}
