// ── Feed client ──
//
// Public handle for one live-feed session. Control calls enqueue a
// command for the connection manager task and return immediately;
// results are observed through emitted events or the state watch.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use realmfeed_api::{Transport, WebSocketTransport};

use crate::config::FeedConfig;
use crate::emitter::{Emitter, Subscription};
use crate::error::CoreError;
use crate::manager::{ConnectionManager, Control};
use crate::model::{ConnectionState, FeedEvent};

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. The connection manager task
/// runs until [`shutdown()`](Self::shutdown) is called or the last clone
/// is dropped. Must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct FeedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: FeedConfig,
    emitter: Emitter,
    control: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl FeedClient {
    /// Validate `config` and start the connection manager in `idle`.
    ///
    /// Nothing is opened until [`connect()`](Self::connect) or
    /// [`force_mock()`](Self::force_mock) is called.
    pub fn new(config: FeedConfig, transport: Arc<dyn Transport>) -> Result<Self, CoreError> {
        config.validate()?;

        let emitter = Emitter::new();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let cancel = CancellationToken::new();
        let control = ConnectionManager::spawn(
            config.clone(),
            transport,
            emitter.clone(),
            state_tx,
            cancel.clone(),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                emitter,
                control,
                state: state_rx,
                cancel,
            }),
        })
    }

    /// Client over the WebSocket transport.
    pub fn websocket(config: FeedConfig) -> Result<Self, CoreError> {
        Self::new(config, Arc::new(WebSocketTransport::new()))
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    // ── Control ──────────────────────────────────────────────────────

    /// Start (or restart) connecting to the live endpoint.
    pub fn connect(&self) {
        self.send(Control::Connect);
    }

    /// Stop everything and return to `idle`. No automatic retry follows.
    pub fn disconnect(&self) {
        self.send(Control::Disconnect);
    }

    /// `true` switches to the synthetic feed immediately; `false` leaves
    /// mock mode and reconnects. `false` outside mock mode does nothing.
    pub fn force_mock(&self, enabled: bool) {
        self.send(Control::ForceMock(enabled));
    }

    /// Stop the connection manager. Later control calls are ignored.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn send(&self, cmd: Control) {
        if self.inner.control.send(cmd).is_err() {
            debug!(?cmd, "connection manager stopped, ignoring control");
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        self.inner.emitter.subscribe(listener)
    }

    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<FeedEvent>) {
        self.inner.emitter.subscribe_channel()
    }

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_using_mock(&self) -> bool {
        self.state().is_mock()
    }

    /// Receiver that resolves on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.clone()
    }

    /// Wait until the connection reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<(), CoreError> {
        let mut rx = self.watch_state();
        rx.wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| CoreError::Internal("connection manager stopped".into()))
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("endpoint", &self.inner.config.endpoint.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
