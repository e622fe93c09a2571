// ── Event fan-out ──
//
// Single publish point for live data, synthetic data, and connection
// state changes. Delivery is synchronous, in publish order, to the
// listeners registered at publish time.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::CoreError;
use crate::model::FeedEvent;

type Listener = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

#[derive(Clone)]
struct Slot {
    id: u64,
    listener: Listener,
}

struct EmitterInner {
    /// Copy-on-write listener list. `publish` iterates a snapshot, so
    /// listeners may (un)subscribe from inside a callback.
    listeners: ArcSwap<Vec<Slot>>,
    next_id: AtomicU64,
}

/// Synchronous fan-out point for [`FeedEvent`]s.
///
/// Cheaply cloneable; clones share the same listener set. A listener that
/// panics is logged and skipped -- the rest still receive the event and the
/// publisher never sees the failure.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<EmitterInner>,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                listeners: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FeedEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Slot {
            id,
            listener: Arc::new(listener),
        };
        self.inner.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(slot.clone());
            next
        });

        Subscription {
            id,
            emitter: Arc::downgrade(&self.inner),
        }
    }

    /// Bridge events into an unbounded channel for async consumers.
    ///
    /// Once the receiver is dropped the forwarding listener does nothing;
    /// drop the subscription to remove it.
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    /// Deliver `event` to every current listener, in registration order.
    pub fn publish(&self, event: &FeedEvent) {
        let listeners = self.inner.listeners.load_full();
        for slot in listeners.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (slot.listener)(event)));
            if let Err(payload) = outcome {
                let err = CoreError::ListenerFailure {
                    reason: panic_message(payload.as_ref()),
                };
                warn!(
                    listener = slot.id,
                    kind = event.kind(),
                    error = %err,
                    "listener failed, continuing delivery"
                );
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.load().len()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// Handle to a registered listener. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    emitter: Weak<EmitterInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered for the emitter's whole lifetime.
    pub fn detach(mut self) {
        self.emitter = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.emitter.upgrade() else {
            return;
        };
        let id = self.id;
        inner.listeners.rcu(|current| {
            current
                .iter()
                .filter(|slot| slot.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked".into()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
