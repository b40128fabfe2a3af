//! Connection configuration
//!
//! Read-only for the engine: endpoint choice, backend, timeouts and the
//! reconnection ceiling.

use crate::memory::MemoryConnector;
use crate::tcp::TcpConnector;
use crate::transport::Connector;
use crate::websocket::WebSocketConnector;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Which configured relay endpoint to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerTarget {
    /// Local development relay
    Local,
    /// Hosted relay
    Remote,
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerTarget::Local => f.write_str("Local"),
            ServerTarget::Remote => f.write_str("Remote"),
        }
    }
}

impl FromStr for ServerTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ServerTarget::Local),
            "remote" | "render" => Ok(ServerTarget::Remote),
            other => Err(format!("unknown server target: {}", other)),
        }
    }
}

/// Transport backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    WebSocket,
    Tcp,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            "tcp" => Ok(TransportKind::Tcp),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// Build the connector for a backend
pub fn connector_for(kind: TransportKind) -> Arc<dyn Connector> {
    match kind {
        TransportKind::WebSocket => Arc::new(WebSocketConnector),
        TransportKind::Tcp => Arc::new(TcpConnector),
    }
}

/// Build an in-process connector, returning a handle for the server side
pub fn memory_connector() -> (Arc<dyn Connector>, MemoryConnector) {
    let connector = MemoryConnector::new();
    (Arc::new(connector.clone()), connector)
}

/// Configuration for the relay connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Local relay URL
    pub local_url: String,
    /// Hosted relay URL
    pub remote_url: String,
    /// Selected endpoint
    pub target: ServerTarget,
    /// Transport backend
    pub transport: TransportKind,
    /// Bound on each connect or reconnect attempt
    pub connect_timeout: Duration,
    /// Minimum spacing between reconnection attempts
    pub reconnect_cooldown: Duration,
    /// Attempts allowed before giving up for good
    pub max_reconnect_attempts: u32,
    /// Version stamped on every outbound frame
    pub app_version: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            local_url: "ws://localhost:9000/ws".to_string(),
            remote_url: "wss://cheap-bingo-go-server.onrender.com/ws".to_string(),
            target: ServerTarget::Remote,
            transport: TransportKind::WebSocket,
            connect_timeout: Duration::from_secs(15),
            reconnect_cooldown: Duration::from_secs(5),
            max_reconnect_attempts: 3,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Create config for the local relay
    pub fn local() -> Self {
        Self {
            target: ServerTarget::Local,
            ..Default::default()
        }
    }

    /// Read overrides from `BINGO_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(target) = env_parse::<ServerTarget>("BINGO_SERVER") {
            config.target = target;
        }
        if let Ok(url) = std::env::var("BINGO_LOCAL_URL") {
            config.local_url = url;
        }
        if let Ok(url) = std::env::var("BINGO_REMOTE_URL") {
            config.remote_url = url;
        }
        if let Some(kind) = env_parse::<TransportKind>("BINGO_TRANSPORT") {
            config.transport = kind;
        }
        if let Some(secs) = env_parse::<u64>("BINGO_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("BINGO_RECONNECT_COOLDOWN_SECS") {
            config.reconnect_cooldown = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_parse::<u32>("BINGO_MAX_RECONNECT_ATTEMPTS") {
            config.max_reconnect_attempts = attempts;
        }

        config
    }

    pub fn with_target(mut self, target: ServerTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_reconnect(mut self, cooldown: Duration, max_attempts: u32) -> Self {
        self.reconnect_cooldown = cooldown;
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// URL of the selected endpoint
    pub fn url(&self) -> &str {
        match self.target {
            ServerTarget::Local => &self.local_url,
            ServerTarget::Remote => &self.remote_url,
        }
    }
}

fn env_parse<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
