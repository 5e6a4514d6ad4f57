use crate::config::Config;
use crate::messages::{AppEvent, TransportEvent};
use crate::net::{Backend, Connector, HttpBackend, WsConnector};
use crate::protocol;
use crate::services::{Dispatcher, Transport, TransportHandle};
use crate::store::StateStore;

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Wires the transport, store and dispatcher together and runs the event
/// loop that keeps the store in sync with the backend.
pub struct App {
    store: StateStore,
    dispatcher: Dispatcher,
    transport: TransportHandle,
    transport_rx: mpsc::Receiver<TransportEvent>,
    app_tx: mpsc::Sender<AppEvent>,
    app_rx: mpsc::Receiver<AppEvent>,
    refresh_delay: Duration,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.base_url, config.request_timeout())?);
        let connector = Box::new(WsConnector::new(config.ws_url()?));

        tracing::info!("Using backend at {}", config.base_url);
        Ok(Self::with_parts(config, backend, connector))
    }

    pub fn with_parts(
        config: &Config,
        backend: Arc<dyn Backend>,
        connector: Box<dyn Connector>,
    ) -> Self {
        let store = StateStore::new();
        let dispatcher = Dispatcher::new(backend, store.clone());
        let (transport, transport_rx) =
            Self::setup_transport(connector, config.reconnect_delay());
        let (app_tx, app_rx) = mpsc::channel(10);

        Self {
            store,
            dispatcher,
            transport,
            transport_rx,
            app_tx,
            app_rx,
            refresh_delay: config.recordings_refresh_delay(),
        }
    }

    pub fn store(&self) -> StateStore {
        self.store.clone()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub fn transport(&self) -> TransportHandle {
        self.transport.clone()
    }

    /// Run until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down");
        })
        .await
    }

    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.load_all().await;

        tokio::pin!(shutdown);
        loop {
            tracing::debug!("Main loop: waiting for event");
            tokio::select! {
                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }
                Some(event) = self.app_rx.recv() => {
                    self.handle_app_event(event).await;
                }
                _ = &mut shutdown => break,
            }
        }

        if let Err(e) = self.transport.close().await {
            tracing::debug!("Transport already stopped: {:#}", e);
        }
        Ok(())
    }

    async fn load_all(&self) {
        // Failures are logged by the dispatcher; the next reconnect retries.
        let _ = tokio::join!(
            self.dispatcher.refresh_settings(),
            self.dispatcher.refresh_recordings()
        );
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.store.set_connected(true);
                self.load_all().await;
            }
            TransportEvent::Disconnected => {
                self.store.set_connected(false);
            }
            TransportEvent::Message(text) => self.handle_message(&text),
        }
    }

    async fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RefreshRecordings => {
                tracing::debug!("Refreshing recordings after recording stopped");
                let _ = self.dispatcher.refresh_recordings().await;
            }
        }
    }

    fn handle_message(&self, text: &str) {
        let message = match protocol::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Dropping malformed message: {:#} ({})", e, text);
                return;
            }
        };

        if let Some(patch) = message.status {
            let change = self.store.apply_status(patch);
            if change.recording_stopped {
                tracing::info!("Recording stopped, refreshing list shortly");
                self.schedule(AppEvent::RefreshRecordings, self.refresh_delay);
            }
        }

        if let Some(settings) = message.config {
            self.store.set_settings(settings);
        }

        if let Some(recordings) = message.recordings {
            self.store.set_recordings(recordings);
        }
    }

    /// Deliver `event` to the loop after `delay`, giving the backend time
    /// to finalize the file.
    fn schedule(&self, event: AppEvent, delay: Duration) {
        let tx = self.app_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event).await;
        });
    }

    fn setup_transport(
        connector: Box<dyn Connector>,
        reconnect_delay: Duration,
    ) -> (TransportHandle, mpsc::Receiver<TransportEvent>) {
        let (transport, handle, events) = Transport::create(connector, reconnect_delay);
        tokio::spawn(transport.run());
        (handle, events)
    }
}
