use crate::messages::{TransportCommand, TransportEvent};
use crate::net::{Connection, Connector};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Dropped,
    Closed,
}

/// Owns the push-channel connection to the backend
///
/// This service:
/// - Opens one connection at a time and forwards incoming payloads
/// - Reconnects after a fixed delay whenever the connection drops or a
///   connect attempt fails, with no retry cap
/// - Publishes the connected flag through a watch channel
/// - Drops outbound messages while disconnected
///
/// The run loop is the only place a connection is opened, and it never
/// opens a new one before the previous one has been dropped.
pub struct Transport {
    connector: Box<dyn Connector>,
    reconnect_delay: Duration,
    cmd_rx: mpsc::Receiver<TransportCommand>,
    event_tx: mpsc::Sender<TransportEvent>,
    connected_tx: watch::Sender<bool>,
}

impl Transport {
    pub fn new(
        connector: Box<dyn Connector>,
        reconnect_delay: Duration,
        cmd_rx: mpsc::Receiver<TransportCommand>,
        event_tx: mpsc::Sender<TransportEvent>,
        connected_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            connector,
            reconnect_delay,
            cmd_rx,
            event_tx,
            connected_tx,
        }
    }

    /// Build a transport and its handle. The caller spawns `run()`.
    pub fn create(
        connector: Box<dyn Connector>,
        reconnect_delay: Duration,
    ) -> (Self, TransportHandle, mpsc::Receiver<TransportEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(100);
        let (connected_tx, connected_rx) = watch::channel(false);

        let transport = Self::new(connector, reconnect_delay, cmd_rx, event_tx, connected_tx);
        let handle = TransportHandle::new(cmd_tx, connected_rx);

        (transport, handle, event_rx)
    }

    pub async fn run(mut self) {
        loop {
            match self.connector.connect().await {
                Ok(conn) => {
                    tracing::info!("Connected to backend");
                    if !self.set_connected(true).await {
                        break;
                    }

                    let end = self.session(conn).await;

                    if !self.set_connected(false).await || end == SessionEnd::Closed {
                        break;
                    }

                    tracing::warn!(
                        "Connection lost, reconnecting in {:?}",
                        self.reconnect_delay
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Connection attempt failed: {:#}; retrying in {:?}",
                        e,
                        self.reconnect_delay
                    );
                }
            }

            if !self.wait_before_reconnect().await {
                break;
            }
        }

        self.connected_tx.send_replace(false);
        tracing::info!("Transport stopped");
    }

    /// Returns false once nobody is listening for events anymore.
    async fn set_connected(&mut self, connected: bool) -> bool {
        self.connected_tx.send_replace(connected);

        let event = if connected {
            TransportEvent::Connected
        } else {
            TransportEvent::Disconnected
        };
        self.event_tx.send(event).await.is_ok()
    }

    async fn session(&mut self, mut conn: Box<dyn Connection>) -> SessionEnd {
        loop {
            tokio::select! {
                incoming = conn.recv() => match incoming {
                    Some(text) => {
                        if self.event_tx.send(TransportEvent::Message(text)).await.is_err() {
                            conn.close().await;
                            return SessionEnd::Closed;
                        }
                    }
                    None => return SessionEnd::Dropped,
                },

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(TransportCommand::Send(text)) => {
                        if let Err(e) = conn.send(text).await {
                            tracing::warn!("Send failed, dropping connection: {:#}", e);
                            return SessionEnd::Dropped;
                        }
                    }
                    Some(TransportCommand::Close) | None => {
                        conn.close().await;
                        return SessionEnd::Closed;
                    }
                },
            }
        }
    }

    /// Sleep out the reconnect delay while still answering commands.
    /// Returns false if the transport was closed meanwhile.
    async fn wait_before_reconnect(&mut self) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return true,

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(TransportCommand::Send(_)) => {
                        tracing::warn!("Not connected, dropping outbound message");
                    }
                    Some(TransportCommand::Close) | None => return false,
                },
            }
        }
    }
}

/// Handle for communicating with the Transport
#[derive(Clone)]
pub struct TransportHandle {
    tx: mpsc::Sender<TransportCommand>,
    connected: watch::Receiver<bool>,
}

impl TransportHandle {
    pub fn new(tx: mpsc::Sender<TransportCommand>, connected: watch::Receiver<bool>) -> Self {
        Self { tx, connected }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Send a text message. Dropped with a warning while disconnected.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        if !self.is_connected() {
            tracing::warn!("Not connected, dropping outbound message");
            return Ok(());
        }

        self.tx
            .send(TransportCommand::Send(text.into()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send message command: {}", e))
    }

    pub async fn close(&self) -> Result<()> {
        self.tx
            .send(TransportCommand::Close)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send close command: {}", e))
    }
}
