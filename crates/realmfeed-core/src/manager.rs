// ── Connection manager ──
//
// Owns the connection state machine. Runs as a single task: control
// commands from `FeedClient`, transport results, timer expiries, and
// synthesizer ticks all arrive on its inboxes and are handled one at a
// time, so no two transitions ever interleave.
//
//   idle ──connect──▶ connecting ──established──▶ open
//                       │    ▲                      │
//            fail/timeout    └──retry due── closed ◀┘ dropped
//                       ▼                      │
//                     closed ──budget spent──▶ mock
//
// Every spawned piece of work (session task, attempt timeout, retry
// delay) is tagged with the attempt id it was started for. Any signal
// whose id no longer matches the current attempt is ignored.

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};
use url::Url;

use realmfeed_api::{Transport, decode_frame};

use crate::budget::{RetryBudget, RetryDecision};
use crate::config::FeedConfig;
use crate::convert::event_from_live;
use crate::emitter::Emitter;
use crate::error::CoreError;
use crate::model::{ConnectionState, FeedEvent};
use crate::synth::Synthesizer;
use crate::timer::Timer;

/// Requests from the public client surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Connect,
    Disconnect,
    ForceMock(bool),
}

/// Notifications from work the manager spawned.
#[derive(Debug)]
enum Signal {
    Established { attempt: u64 },
    AttemptFailed { attempt: u64, error: realmfeed_api::Error },
    Frame { attempt: u64, text: String },
    Dropped { attempt: u64, error: Option<realmfeed_api::Error> },
    AttemptTimeout { attempt: u64 },
    RetryDue { attempt: u64 },
    SynthTick { generation: u64 },
}

pub(crate) struct ConnectionManager {
    config: FeedConfig,
    transport: Arc<dyn Transport>,
    emitter: Emitter,
    state: watch::Sender<ConnectionState>,
    synth: Synthesizer,
    budget: RetryBudget,
    attempt: u64,
    /// Cancels the in-flight session task (connect + read loop) on drop.
    session: Option<DropGuard>,
    attempt_timer: Option<Timer>,
    retry_timer: Option<Timer>,
    signals: mpsc::UnboundedSender<Signal>,
}

impl ConnectionManager {
    /// Spawn the manager task. Returns the control inbox.
    ///
    /// The task stops when `cancel` fires or every control sender is gone.
    pub(crate) fn spawn(
        config: FeedConfig,
        transport: Arc<dyn Transport>,
        emitter: Emitter,
        state: watch::Sender<ConnectionState>,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedSender<Control> {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let budget = RetryBudget::new(config.max_retries, config.backoff_base, config.backoff_max);
        let synth = Synthesizer::new(config.synth.clone(), emitter.clone());

        let manager = Self {
            config,
            transport,
            emitter,
            state,
            synth,
            budget,
            attempt: 0,
            session: None,
            attempt_timer: None,
            retry_timer: None,
            signals: signal_tx,
        };
        tokio::spawn(manager.run(control_rx, signal_rx, cancel));

        control_tx
    }

    async fn run(
        mut self,
        mut control: mpsc::UnboundedReceiver<Control>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
        cancel: CancellationToken,
    ) {
        debug!(endpoint = %self.config.endpoint, "connection manager started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                cmd = control.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_control(cmd);
                }
                Some(signal) = signals.recv() => self.handle_signal(signal),
            }
        }
        self.teardown();
        debug!("connection manager stopped");
    }

    // ── Control surface ──────────────────────────────────────────────

    fn handle_control(&mut self, cmd: Control) {
        let state = self.current();
        debug!(?cmd, %state, "control");
        match (cmd, state) {
            (Control::Connect, ConnectionState::Idle | ConnectionState::Closed) => {
                self.budget.reset();
                self.begin_attempt();
            }
            // Supersede the in-flight attempt; its late result is stale.
            (Control::Connect, ConnectionState::Connecting) => self.begin_attempt(),
            (Control::Connect | Control::ForceMock(false), ConnectionState::Mock) => {
                self.leave_mock_and_connect();
            }
            (Control::ForceMock(true), ConnectionState::Mock)
            | (Control::ForceMock(false) | Control::Connect, _) => {}
            (Control::ForceMock(true), _) => {
                info!(from = %state, "mock mode forced");
                self.enter_mock();
            }
            (Control::Disconnect, _) => {
                self.release_attempt();
                self.synth.stop();
                self.budget.reset();
                self.transition(ConnectionState::Idle);
            }
        }
    }

    // ── Signals ──────────────────────────────────────────────────────

    fn handle_signal(&mut self, signal: Signal) {
        let state = self.current();
        match signal {
            Signal::Established { attempt } if self.is_live(attempt, ConnectionState::Connecting) => {
                self.attempt_timer = None;
                self.budget.reset();
                self.transition(ConnectionState::Open);
            }
            Signal::AttemptFailed { attempt, error }
                if self.is_live(attempt, ConnectionState::Connecting) =>
            {
                let error = CoreError::from(error);
                warn!(attempt, error = %error, "connection attempt failed");
                self.fail_attempt();
            }
            Signal::AttemptTimeout { attempt } if self.is_live(attempt, ConnectionState::Connecting) => {
                let error = CoreError::from(realmfeed_api::Error::Timeout {
                    timeout_ms: millis(self.config.attempt_timeout),
                });
                warn!(attempt, error = %error, "connection attempt timed out");
                self.fail_attempt();
            }
            Signal::Frame { attempt, text } if self.is_live(attempt, ConnectionState::Open) => {
                self.forward_frame(&text);
            }
            Signal::Dropped { attempt, error } if self.is_live(attempt, ConnectionState::Open) => {
                match error {
                    Some(error) => warn!(error = %CoreError::from(error), "live connection lost"),
                    None => info!("live connection closed by remote"),
                }
                self.fail_attempt();
            }
            Signal::RetryDue { attempt } if self.is_live(attempt, ConnectionState::Closed) => {
                self.begin_attempt();
            }
            Signal::SynthTick { generation } => {
                if state.is_mock() {
                    self.synth.on_tick(generation);
                }
            }
            stale => debug!(?stale, current = self.attempt, %state, "ignoring stale signal"),
        }
    }

    fn is_live(&self, attempt: u64, expected: ConnectionState) -> bool {
        attempt == self.attempt && self.current() == expected
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Cancel the session and both connection timers, and invalidate
    /// everything tagged with the current attempt id.
    fn release_attempt(&mut self) {
        self.session = None;
        self.attempt_timer = None;
        self.retry_timer = None;
        self.attempt += 1;
    }

    fn begin_attempt(&mut self) {
        self.release_attempt();
        let attempt = self.attempt;
        self.transition(ConnectionState::Connecting);
        info!(
            attempt,
            failures = self.budget.failures(),
            endpoint = %self.config.endpoint,
            "opening live connection"
        );

        let token = CancellationToken::new();
        let cancel = token.clone();
        let session = run_session(
            Arc::clone(&self.transport),
            self.config.endpoint.clone(),
            attempt,
            self.signals.clone(),
        );
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = session => {}
            }
        });
        self.session = Some(token.drop_guard());

        let signals = self.signals.clone();
        self.attempt_timer = Some(Timer::after(self.config.attempt_timeout, move || {
            let _ = signals.send(Signal::AttemptTimeout { attempt });
        }));
    }

    /// Shared path for failed attempts, timeouts, and dropped connections.
    fn fail_attempt(&mut self) {
        self.release_attempt();
        self.transition(ConnectionState::Closed);

        match self.budget.record_failure() {
            RetryDecision::RetryAfter(delay) => {
                let attempt = self.attempt;
                info!(
                    failures = self.budget.failures(),
                    max_retries = self.budget.max_retries(),
                    delay_ms = millis(delay),
                    "scheduling reconnect"
                );
                let signals = self.signals.clone();
                self.retry_timer = Some(Timer::after(delay, move || {
                    let _ = signals.send(Signal::RetryDue { attempt });
                }));
            }
            RetryDecision::Exhausted => {
                warn!(
                    failures = self.budget.failures(),
                    "retry budget exhausted, falling back to synthetic feed"
                );
                self.enter_mock();
            }
        }
    }

    fn enter_mock(&mut self) {
        self.release_attempt();
        self.transition(ConnectionState::Mock);
        let signals = self.signals.clone();
        self.synth.start(move |generation| {
            let _ = signals.send(Signal::SynthTick { generation });
        });
    }

    fn leave_mock_and_connect(&mut self) {
        self.synth.stop();
        self.budget.reset();
        self.begin_attempt();
    }

    /// Move to `next`, emitting `connection-changed` only on an actual change.
    fn transition(&mut self, next: ConnectionState) {
        let prev = self.current();
        if prev == next {
            return;
        }
        self.state.send_replace(next);
        info!(from = %prev, to = %next, "connection state changed");
        self.emitter.publish(&FeedEvent::connection_changed(next));
    }

    fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    // ── Live data ────────────────────────────────────────────────────

    fn forward_frame(&self, text: &str) {
        let decoded = match decode_frame(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %CoreError::from(e), "dropping malformed frame");
                return;
            }
        };
        for rejected in decoded.rejected {
            warn!(error = %CoreError::from(rejected), "dropping malformed message");
        }

        let received_at = Utc::now();
        for msg in decoded.messages {
            match event_from_live(msg, received_at) {
                Ok(event) => self.emitter.publish(&event),
                Err(e) => warn!(error = %e, "dropping malformed message"),
            }
        }
    }

    fn teardown(&mut self) {
        self.release_attempt();
        self.synth.stop();
        self.state.send_replace(ConnectionState::Idle);
    }
}

// ── Session task ─────────────────────────────────────────────────────

/// Open the transport and pump frames until the connection ends.
///
/// Only reports; the manager decides whether a report is still current.
async fn run_session(
    transport: Arc<dyn Transport>,
    endpoint: Url,
    attempt: u64,
    signals: mpsc::UnboundedSender<Signal>,
) {
    let mut frames = match transport.open(&endpoint).await {
        Ok(frames) => frames,
        Err(error) => {
            let _ = signals.send(Signal::AttemptFailed { attempt, error });
            return;
        }
    };
    if signals.send(Signal::Established { attempt }).is_err() {
        return;
    }

    loop {
        match frames.next().await {
            Some(Ok(text)) => {
                if signals.send(Signal::Frame { attempt, text }).is_err() {
                    return;
                }
            }
            Some(Err(error)) => {
                let _ = signals.send(Signal::Dropped {
                    attempt,
                    error: Some(error),
                });
                return;
            }
            None => {
                let _ = signals.send(Signal::Dropped {
                    attempt,
                    error: None,
                });
                return;
            }
        }
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
