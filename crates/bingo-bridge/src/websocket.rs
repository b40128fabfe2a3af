//! WebSocket transport implementation
//!
//! The default backend, used against both the local development relay
//! (`ws://`) and the hosted one (`wss://`).

use crate::transport::{AsyncReader, AsyncWriter, CLOSE_ABNORMAL, Connection, Connector, Frame};
use async_trait::async_trait;
use bingo_core::{BingoError, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when a close frame carries no status
const CLOSE_NO_STATUS: u16 = 1005;

/// WebSocket read wrapper
pub struct WsReadWrapper(SplitStream<WsStream>);

#[async_trait]
impl AsyncReader for WsReadWrapper {
    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            let msg = match self.0.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Ok(Frame::Close {
                        code: Some(CLOSE_ABNORMAL),
                        reason: e.to_string(),
                    });
                }
                None => {
                    return Ok(Frame::Close {
                        code: Some(CLOSE_ABNORMAL),
                        reason: "stream ended without close frame".into(),
                    });
                }
            };

            match msg {
                Message::Text(text) => return Ok(Frame::Text(text)),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes).map(Frame::Text).map_err(|e| {
                        BingoError::Transport(format!("Binary frame is not UTF-8: {}", e))
                    });
                }
                Message::Close(Some(close)) => {
                    return Ok(Frame::Close {
                        code: Some(u16::from(close.code)),
                        reason: close.reason.to_string(),
                    });
                }
                Message::Close(None) => {
                    return Ok(Frame::Close {
                        code: Some(CLOSE_NO_STATUS),
                        reason: String::new(),
                    });
                }
                // Pings are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    debug!("Skipping control frame");
                }
            }
        }
    }
}

/// WebSocket write wrapper
pub struct WsWriteWrapper(SplitSink<WsStream, Message>);

#[async_trait]
impl AsyncWriter for WsWriteWrapper {
    async fn write_text(&mut self, text: &str) -> Result<()> {
        self.0
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| BingoError::Transport(format!("WebSocket send failed: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        self.0
            .close()
            .await
            .map_err(|e| BingoError::Transport(format!("WebSocket close failed: {}", e)))
    }
}

/// Opens WebSocket connections
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Connection> {
        info!("Creating WebSocket connection to: {}", url);

        if url.starts_with("wss://") {
            // Pick the ring provider once; later calls report it is already set
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| BingoError::Transport(format!("WebSocket creation failed: {}", e)))?;
        debug!("WebSocket handshake status: {}", response.status());

        let (sink, stream) = stream.split();
        Ok(Connection {
            reader: Box::new(WsReadWrapper(stream)),
            writer: Box::new(WsWriteWrapper(sink)),
        })
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}
