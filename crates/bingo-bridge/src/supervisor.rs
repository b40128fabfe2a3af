//! Connection supervision
//!
//! `ConnectionSupervisor` owns the single live transport, reconnects it
//! after drops within a bounded number of attempts, and hands inbound
//! traffic to the tick thread as an ordered batch.
//!
//! Network callbacks never touch supervisor state. Connect, reader and
//! writer tasks only push [`TransportEvent`]s onto an unbounded queue;
//! [`ConnectionSupervisor::drain_queued`] applies them in FIFO order on
//! whichever thread owns the supervisor. Every event carries the
//! generation of the connection that produced it, and events from a
//! replaced connection are dropped on arrival.

use crate::config::{ConnectionConfig, ServerTarget};
use crate::protocol::{NetworkMessage, encode};
use crate::transport::{
    CloseReason, Connector, EventQueue, Outbound, QueuedEvent, TransportEvent, spawn_io_tasks,
};
use bingo_core::{BingoError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Anything the session layer can send protocol messages through
pub trait MessageSink {
    /// Whether a transport is open right now
    fn is_connected(&self) -> bool;

    /// Queue a message for sending. Never blocks.
    fn send_message(&mut self, msg: &NetworkMessage) -> Result<()>;
}

/// Room state the supervisor needs to apply its drop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStatus {
    /// Not in a room
    #[default]
    None,
    /// Room requested or waiting for an opponent
    Pending,
    /// Match in progress
    Ready,
}

/// What the tick thread learns from a drain
#[derive(Debug)]
pub enum SupervisorEvent {
    /// Transport opened
    Connected { reconnected: bool },
    /// Transport closed
    Disconnected {
        code: Option<u16>,
        reason: CloseReason,
        detail: String,
    },
    /// The room was lost with the transport; unwind as if exited
    ImplicitExit,
    /// Inbound text frame, still encoded
    Frame(String),
    /// Recoverable or terminal failure to report
    Error(BingoError),
}

/// Bookkeeping for bounded reconnection
#[derive(Debug, Clone, Default)]
pub struct ReconnectState {
    /// Attempts since the last successful connection
    pub attempts: u32,
    /// Earliest time the next attempt may start
    pub cooldown_until: Option<Instant>,
    /// An attempt is in flight
    pub is_reconnecting: bool,
    /// The link dropped during a match and should be restored
    pub armed: bool,
    /// The ceiling was hit; no further attempts
    pub exhausted: bool,
}

#[derive(Debug)]
enum Link {
    /// Never connected, or deliberately disconnected
    Idle,
    /// Connect attempt in flight
    Connecting,
    /// Transport open
    Open(mpsc::UnboundedSender<Outbound>),
    /// Transport lost
    Down,
}

/// Owner of the relay transport
pub struct ConnectionSupervisor {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<QueuedEvent>,
    events_rx: mpsc::UnboundedReceiver<QueuedEvent>,
    /// Identity of the current connection; bumped on every attempt
    generation: u64,
    link: Link,
    reconnect: ReconnectState,
    room: RoomStatus,
}

impl ConnectionSupervisor {
    /// Create a supervisor that spawns its connection tasks on `runtime`
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connector,
            runtime,
            events_tx,
            events_rx,
            generation: 0,
            link: Link::Idle,
            reconnect: ReconnectState::default(),
            room: RoomStatus::None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn reconnect_state(&self) -> &ReconnectState {
        &self.reconnect
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Open(_))
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect.is_reconnecting
    }

    /// Tell the supervisor what room state the session is in
    pub fn set_room_status(&mut self, status: RoomStatus) {
        self.room = status;
    }

    /// Open a connection to the configured endpoint unless one is open or
    /// opening already
    pub fn connect(&mut self) {
        match self.link {
            Link::Open(_) => debug!("Already connected to relay"),
            Link::Connecting => debug!("Connection attempt already in flight"),
            Link::Idle | Link::Down => self.spawn_connect(),
        }
    }

    /// Close the transport and forget anything it still has queued
    pub fn disconnect(&mut self) {
        if let Link::Open(tx) = std::mem::replace(&mut self.link, Link::Idle) {
            let _ = tx.send(Outbound::Close);
        }
        self.generation += 1;
        self.reconnect = ReconnectState::default();
        info!("Disconnected from relay");
    }

    /// Drop the current transport and connect afresh
    pub fn restart(&mut self) {
        self.disconnect();
        self.spawn_connect();
    }

    /// Select another endpoint and reconnect to it
    pub fn switch_target(&mut self, target: ServerTarget) {
        if self.config.target == target && !matches!(self.link, Link::Idle | Link::Down) {
            debug!("Already using {} relay", target);
            return;
        }
        self.config.target = target;
        info!("Switched to {} relay", target);
        self.restart();
    }

    /// Forget earlier reconnection attempts
    pub fn reset_reconnect(&mut self) {
        self.reconnect = ReconnectState::default();
        debug!("Reconnection state reset");
    }

    /// Queue a text frame on the open transport
    pub fn send(&self, text: String) -> Result<()> {
        match &self.link {
            Link::Open(tx) => tx
                .send(Outbound::Text(text))
                .map_err(|_| BingoError::NotConnected),
            _ => Err(BingoError::NotConnected),
        }
    }

    /// Apply the oldest queued transport event from the live connection.
    ///
    /// Returns what it produced, or `None` once the queue is empty. Owners
    /// that feed room state back through [`set_room_status`] call this in a
    /// loop so each event sees the state left by the previous one.
    ///
    /// [`set_room_status`]: ConnectionSupervisor::set_room_status
    pub fn apply_next(&mut self, now: Instant) -> Option<Vec<SupervisorEvent>> {
        while let Ok(queued) = self.events_rx.try_recv() {
            if queued.generation != self.generation {
                debug!(
                    "Dropping stale event from gen={} (current gen={})",
                    queued.generation, self.generation
                );
                // A superseded connect that finished anyway is closed at once
                if let TransportEvent::Opened(tx) = queued.event {
                    let _ = tx.send(Outbound::Close);
                }
                continue;
            }
            let mut out = Vec::new();
            self.apply(queued.event, now, &mut out);
            return Some(out);
        }
        None
    }

    /// Apply every queued transport event in arrival order.
    ///
    /// Never blocks; returns what the tick thread should act on.
    pub fn drain_queued(&mut self, now: Instant) -> Vec<SupervisorEvent> {
        let mut out = Vec::new();
        while let Some(events) = self.apply_next(now) {
            out.extend(events);
        }
        out
    }

    /// Start a reconnection attempt if the policy allows one now.
    ///
    /// Returns the terminal error the first time the ceiling is reached.
    pub fn poll_reconnect(&mut self, now: Instant) -> Option<SupervisorEvent> {
        let reconnect = &mut self.reconnect;
        if !matches!(self.link, Link::Down)
            || !reconnect.armed
            || reconnect.is_reconnecting
            || reconnect.exhausted
        {
            return None;
        }

        let max = self.config.max_reconnect_attempts;
        if reconnect.attempts >= max {
            reconnect.exhausted = true;
            error!("Maximum reconnection attempts reached. Stopping reconnection loop.");
            return Some(SupervisorEvent::Error(BingoError::ReconnectExhausted {
                attempts: reconnect.attempts,
            }));
        }

        if reconnect.cooldown_until.is_some_and(|until| now <= until) {
            return None;
        }

        reconnect.attempts += 1;
        reconnect.is_reconnecting = true;
        reconnect.cooldown_until = Some(now + self.config.reconnect_cooldown);
        warn!(
            "Connection lost, attempting to reconnect... (Attempt {}/{})",
            reconnect.attempts, max
        );
        self.spawn_connect();
        None
    }

    fn spawn_connect(&mut self) {
        self.generation += 1;
        self.link = Link::Connecting;

        let queue = EventQueue::new(self.generation, self.events_tx.clone());
        let connector = Arc::clone(&self.connector);
        let url = self.config.url().to_string();
        let timeout = self.config.connect_timeout;

        info!(
            "Connecting to {} relay at {} via {} (gen={})",
            self.config.target,
            url,
            connector.name(),
            self.generation
        );

        self.runtime.spawn(async move {
            match tokio::time::timeout(timeout, connector.connect(&url)).await {
                Ok(Ok(conn)) => {
                    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                    // Opened must be queued ahead of anything the reader sees
                    if !queue.push(TransportEvent::Opened(outbound_tx)) {
                        return;
                    }
                    spawn_io_tasks(conn, outbound_rx, queue);
                }
                Ok(Err(e)) => {
                    queue.push(TransportEvent::ConnectFailed(e.to_string()));
                }
                Err(_) => {
                    queue.push(TransportEvent::ConnectFailed(format!(
                        "timed out after {}s",
                        timeout.as_secs_f32()
                    )));
                }
            }
        });
    }

    fn apply(&mut self, event: TransportEvent, now: Instant, out: &mut Vec<SupervisorEvent>) {
        match event {
            TransportEvent::Opened(tx) => {
                let reconnected = self.reconnect.is_reconnecting || self.reconnect.armed;
                self.link = Link::Open(tx);
                self.reconnect = ReconnectState::default();
                if reconnected {
                    info!("Reconnection successful!");
                } else {
                    info!("Connection to relay established");
                }
                out.push(SupervisorEvent::Connected { reconnected });
            }
            TransportEvent::Message(text) => {
                out.push(SupervisorEvent::Frame(text));
            }
            TransportEvent::ConnectFailed(detail) => {
                self.link = Link::Down;
                let err = if std::mem::take(&mut self.reconnect.is_reconnecting) {
                    warn!("Reconnection attempt failed: {}", detail);
                    BingoError::Transport(format!(
                        "Reconnection failed: {}. Will retry in {}s.",
                        detail,
                        self.config.reconnect_cooldown.as_secs()
                    ))
                } else {
                    warn!("Connection failed to establish: {}", detail);
                    BingoError::Transport(format!("Connection failed: {}", detail))
                };
                out.push(SupervisorEvent::Error(err));
            }
            TransportEvent::Error(detail) => {
                error!("Transport error: {}", detail);
                out.push(SupervisorEvent::Error(BingoError::ConnectionLost(detail)));
            }
            TransportEvent::Closed { code, reason: detail } => {
                if !matches!(self.link, Link::Open(_)) {
                    debug!("Ignoring repeated close: code={:?} {}", code, detail);
                    return;
                }
                let reason = CloseReason::from_code(code);
                info!("Connection closed: code={:?} ({}) {}", code, reason, detail);
                self.link = Link::Down;
                self.reconnect.is_reconnecting = false;

                match std::mem::take(&mut self.room) {
                    RoomStatus::None => {}
                    status => {
                        out.push(SupervisorEvent::ImplicitExit);
                        if status == RoomStatus::Ready {
                            self.reconnect.armed = true;
                            self.reconnect.cooldown_until =
                                Some(now + self.config.reconnect_cooldown);
                        }
                    }
                }

                out.push(SupervisorEvent::Disconnected {
                    code,
                    reason,
                    detail,
                });
            }
        }
    }
}

impl MessageSink for ConnectionSupervisor {
    fn is_connected(&self) -> bool {
        ConnectionSupervisor::is_connected(self)
    }

    fn send_message(&mut self, msg: &NetworkMessage) -> Result<()> {
        if !ConnectionSupervisor::is_connected(self) {
            return Err(BingoError::NotConnected);
        }
        let text = encode(msg)?;
        self.send(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConnector, MemoryPeer};
    use crate::transport::CLOSE_ABNORMAL;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    const COOLDOWN: Duration = Duration::from_secs(5);

    fn supervisor(max_attempts: u32) -> (ConnectionSupervisor, MemoryConnector) {
        let memory = MemoryConnector::new();
        let config = ConnectionConfig::local().with_reconnect(COOLDOWN, max_attempts);
        let sup = ConnectionSupervisor::new(config, Arc::new(memory.clone()), Handle::current());
        (sup, memory)
    }

    /// Let spawned connection tasks run
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    async fn connected(max_attempts: u32) -> (ConnectionSupervisor, MemoryConnector, MemoryPeer) {
        let (mut sup, memory) = supervisor(max_attempts);
        sup.connect();
        settle().await;
        let events = sup.drain_queued(Instant::now());
        assert!(matches!(
            events.as_slice(),
            [SupervisorEvent::Connected { reconnected: false }]
        ));
        let peer = memory.accept().unwrap();
        (sup, memory, peer)
    }

    #[tokio::test]
    async fn test_send_requires_open_transport() {
        let (mut sup, _memory) = supervisor(3);
        let msg = NetworkMessage::create_room("Ann", "1.0.0");
        match sup.send_message(&msg) {
            Err(BingoError::NotConnected) => {}
            other => panic!("Expected NotConnected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_frames_drain_in_order() {
        let (mut sup, _memory, mut peer) = connected(3).await;

        for i in 0..5 {
            peer.send_text(format!("frame-{}", i)).unwrap();
        }
        settle().await;

        let frames: Vec<String> = sup
            .drain_queued(Instant::now())
            .into_iter()
            .map(|e| match e {
                SupervisorEvent::Frame(text) => text,
                other => panic!("Unexpected event: {:?}", other),
            })
            .collect();
        assert_eq!(frames, vec!["frame-0", "frame-1", "frame-2", "frame-3", "frame-4"]);

        // Nothing left; draining again returns immediately
        assert!(sup.drain_queued(Instant::now()).is_empty());

        assert_ok!(sup.send_message(&NetworkMessage::create_room("Ann", "1.0.0")));
        settle().await;
        let sent = peer.try_recv_message().unwrap();
        assert_eq!(sent.channel, "create-room");
        assert_eq!(sent.res, "Ann");
    }

    #[tokio::test]
    async fn test_close_in_room_emits_implicit_exit_first() {
        let (mut sup, _memory, peer) = connected(3).await;
        sup.set_room_status(RoomStatus::Pending);

        peer.close(1001, "restart");
        settle().await;

        let events = sup.drain_queued(Instant::now());
        assert!(matches!(events[0], SupervisorEvent::ImplicitExit));
        assert!(matches!(
            events[1],
            SupervisorEvent::Disconnected {
                code: Some(1001),
                reason: CloseReason::GoingAway,
                ..
            }
        ));
        assert!(!sup.is_connected());
        // Not a ready match, so no reconnection is armed
        assert!(!sup.reconnect_state().armed);
    }

    #[tokio::test]
    async fn test_close_outside_room_is_just_a_disconnect() {
        let (mut sup, _memory, peer) = connected(3).await;
        peer.close(1000, "bye");
        settle().await;

        let events = sup.drain_queued(Instant::now());
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SupervisorEvent::Disconnected {
                reason: CloseReason::Normal,
                ..
            }
        ));
        assert!(sup.poll_reconnect(Instant::now() + COOLDOWN * 10).is_none());
    }

    #[tokio::test]
    async fn test_reconnect_after_cooldown_until_exhausted() {
        let (mut sup, memory, peer) = connected(3).await;
        sup.set_room_status(RoomStatus::Ready);
        memory.set_online(false);

        let t0 = Instant::now();
        peer.close(CLOSE_ABNORMAL, "");
        settle().await;
        let events = sup.drain_queued(t0);
        assert!(matches!(events[0], SupervisorEvent::ImplicitExit));
        assert!(matches!(
            events[1],
            SupervisorEvent::Disconnected {
                reason: CloseReason::Abnormal,
                ..
            }
        ));

        // Inside the cooldown window nothing happens, up to and including
        // the moment it ends
        assert!(sup.poll_reconnect(t0 + Duration::from_secs(1)).is_none());
        assert!(sup.poll_reconnect(t0 + COOLDOWN).is_none());
        assert!(!sup.is_reconnecting());
        assert_eq!(memory.connect_attempts(), 1);

        let mut now = t0;
        for attempt in 1..=3u32 {
            now += COOLDOWN + Duration::from_millis(1);
            assert!(sup.poll_reconnect(now).is_none());
            assert!(sup.is_reconnecting());
            assert_eq!(sup.reconnect_state().attempts, attempt);

            // Overlapping attempts are not started
            assert!(sup.poll_reconnect(now + COOLDOWN * 2).is_none());

            settle().await;
            let events = sup.drain_queued(now);
            assert!(matches!(
                &events[..],
                [SupervisorEvent::Error(BingoError::Transport(msg))] if msg.contains("Reconnection failed")
            ));
            assert!(!sup.is_reconnecting());
        }
        assert_eq!(memory.connect_attempts(), 4);

        now += COOLDOWN * 2;
        match sup.poll_reconnect(now) {
            Some(SupervisorEvent::Error(BingoError::ReconnectExhausted { attempts: 3 })) => {}
            other => panic!("Expected ReconnectExhausted, got {:?}", other),
        }

        // Terminal: reported once, never retried
        assert!(sup.poll_reconnect(now + COOLDOWN * 10).is_none());
        settle().await;
        assert_eq!(memory.connect_attempts(), 4);
    }

    #[tokio::test]
    async fn test_successful_reconnect_resets_attempts() {
        let (mut sup, memory, peer) = connected(3).await;
        sup.set_room_status(RoomStatus::Ready);

        let t0 = Instant::now();
        peer.close(CLOSE_ABNORMAL, "");
        settle().await;
        sup.drain_queued(t0);

        let now = t0 + COOLDOWN + Duration::from_millis(1);
        assert!(sup.poll_reconnect(now).is_none());
        settle().await;

        let events = sup.drain_queued(now);
        assert!(matches!(
            events.as_slice(),
            [SupervisorEvent::Connected { reconnected: true }]
        ));
        assert!(sup.is_connected());
        assert_eq!(sup.reconnect_state().attempts, 0);
        assert!(!sup.reconnect_state().armed);
        assert!(memory.accept().is_some());
    }

    #[tokio::test]
    async fn test_stale_events_are_ignored() {
        let (mut sup, memory, old_peer) = connected(3).await;

        sup.restart();
        // Traffic from the replaced connection
        let _ = old_peer.send_text("stale");
        old_peer.close(CLOSE_ABNORMAL, "");
        settle().await;

        let events = sup.drain_queued(Instant::now());
        assert!(matches!(
            events.as_slice(),
            [SupervisorEvent::Connected { .. }]
        ));
        assert!(sup.is_connected());

        let fresh = memory.accept().unwrap();
        fresh.send_text("fresh").unwrap();
        settle().await;
        assert!(matches!(
            sup.drain_queued(Instant::now()).as_slice(),
            [SupervisorEvent::Frame(text)] if text == "fresh"
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let (mut sup, memory) = supervisor(3);
        memory.set_online(false);
        sup.connect();
        settle().await;

        let events = sup.drain_queued(Instant::now());
        assert!(matches!(
            events.as_slice(),
            [SupervisorEvent::Error(BingoError::Transport(_))]
        ));
        assert!(!sup.is_connected());
        assert_err!(sup.send("x".into()));
    }

    #[tokio::test]
    async fn test_switch_target_reconnects() {
        let (mut sup, memory, _peer) = connected(3).await;
        assert_eq!(sup.config().target, ServerTarget::Local);

        sup.switch_target(ServerTarget::Remote);
        assert_eq!(sup.config().target, ServerTarget::Remote);
        settle().await;

        assert!(matches!(
            sup.drain_queued(Instant::now()).as_slice(),
            [SupervisorEvent::Connected { reconnected: false }]
        ));
        assert_eq!(memory.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_superseded_connect_is_closed() {
        let (mut sup, memory) = supervisor(3);
        sup.connect();
        // Replaced before the first attempt completes
        sup.restart();
        settle().await;

        assert!(matches!(
            sup.drain_queued(Instant::now()).as_slice(),
            [SupervisorEvent::Connected { reconnected: false }]
        ));
        settle().await;

        assert_eq!(memory.connect_attempts(), 2);
        let peers = [memory.accept().unwrap(), memory.accept().unwrap()];
        // Only the connection the supervisor adopted is still being read
        let live: Vec<bool> = peers.iter().map(|p| p.send_text("ping").is_ok()).collect();
        assert_eq!(live.iter().filter(|ok| **ok).count(), 1);

        settle().await;
        assert!(matches!(
            sup.drain_queued(Instant::now()).as_slice(),
            [SupervisorEvent::Frame(text)] if text == "ping"
        ));
    }

    #[tokio::test]
    async fn test_disconnect_releases_transport() {
        let (mut sup, _memory, mut peer) = connected(3).await;
        sup.disconnect();
        settle().await;

        assert!(peer.recv().await.is_none());
        assert!(peer.send_text("late").is_err());
        assert!(sup.drain_queued(Instant::now()).is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_connection_lost() {
        let (mut sup, _memory, mut peer) = connected(3).await;
        sup.set_room_status(RoomStatus::Ready);
        peer.stop_reading();

        assert_ok!(sup.send("{\"channel\":\"retry\"}".into()));
        settle().await;

        match sup.drain_queued(Instant::now()).as_slice() {
            [
                SupervisorEvent::Error(BingoError::ConnectionLost(_)),
                SupervisorEvent::ImplicitExit,
                SupervisorEvent::Disconnected {
                    code: Some(CLOSE_ABNORMAL),
                    reason: CloseReason::Abnormal,
                    ..
                },
            ] => {}
            other => panic!("Expected ConnectionLost then Disconnected, got {:?}", other),
        }
        assert!(!sup.is_connected());
        assert!(sup.reconnect_state().armed);
    }

    #[tokio::test]
    async fn test_room_status_between_events_decides_arming() {
        let (mut sup, _memory, peer) = connected(3).await;
        sup.set_room_status(RoomStatus::Pending);

        peer.send_text("game-ready").unwrap();
        peer.close(CLOSE_ABNORMAL, "");
        settle().await;

        let now = Instant::now();
        assert!(matches!(
            sup.apply_next(now).as_deref(),
            Some([SupervisorEvent::Frame(_)])
        ));
        // The owner reacts to the frame before the close is applied
        sup.set_room_status(RoomStatus::Ready);
        assert!(matches!(
            sup.apply_next(now).as_deref(),
            Some([SupervisorEvent::ImplicitExit, SupervisorEvent::Disconnected { .. }])
        ));
        assert!(sup.apply_next(now).is_none());
        assert!(sup.reconnect_state().armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reconnect_times_out() {
        let (mut sup, memory, peer) = connected(1).await;
        sup.set_room_status(RoomStatus::Ready);

        let t0 = Instant::now();
        peer.close(CLOSE_ABNORMAL, "");
        settle().await;
        sup.drain_queued(t0);

        memory.set_stalled(true);
        let now = t0 + COOLDOWN + Duration::from_millis(1);
        assert!(sup.poll_reconnect(now).is_none());
        assert!(sup.is_reconnecting());

        // Paused clock: jumps straight past the connect timeout
        tokio::time::sleep(sup.config().connect_timeout + Duration::from_secs(1)).await;
        settle().await;

        match sup.drain_queued(now).as_slice() {
            [SupervisorEvent::Error(BingoError::Transport(msg))]
                if msg.starts_with("Reconnection failed: timed out") => {}
            other => panic!("Expected a timed-out attempt, got {:?}", other),
        }
        assert!(!sup.is_reconnecting());
        assert_eq!(sup.reconnect_state().attempts, 1);

        // The timed-out attempt used up the only one allowed
        match sup.poll_reconnect(now + COOLDOWN * 2) {
            Some(SupervisorEvent::Error(BingoError::ReconnectExhausted { attempts: 1 })) => {}
            other => panic!("Expected ReconnectExhausted, got {:?}", other),
        }
        assert_eq!(memory.connect_attempts(), 2);
    }
}
