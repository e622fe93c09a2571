// ── Entity store ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::emitter::{Emitter, Subscription};
use crate::model::{ConnectionState, Entity, EntityId, FeedEvent};
use crate::stream::EntityStream;

/// Active entity set maintained from [`FeedEvent`]s.
///
/// Upserts replace by id, removals of unknown ids are ignored, and the
/// latest `connection-changed` state is tracked alongside. Live and
/// synthetic entities are treated alike.
pub struct EntityStore {
    entities: EntityCollection,
    connection: watch::Sender<ConnectionState>,
    last_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        let (connection, _) = watch::channel(ConnectionState::Idle);
        let (last_event, _) = watch::channel(None);

        Self {
            entities: EntityCollection::new(),
            connection,
            last_event,
        }
    }

    /// Fold one event into the store.
    pub fn apply(&self, event: &FeedEvent) {
        match event {
            FeedEvent::ConnectionChanged { state, .. } => {
                self.connection.send_replace(*state);
            }
            FeedEvent::EntityUpsert(entity) => {
                self.entities.upsert(entity.clone());
            }
            FeedEvent::EntityRemoved { id } => {
                self.entities.remove(id);
            }
        }
        self.last_event.send_replace(Some(Utc::now()));
    }

    /// Keep this store in sync with `emitter` until the subscription drops.
    pub fn attach(self: &Arc<Self>, emitter: &Emitter) -> Subscription {
        let store = Arc::clone(self);
        emitter.subscribe(move |event| store.apply(event))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.len() == 0
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Entity>>> {
        self.entities.snapshot()
    }

    pub fn subscribe(&self) -> EntityStream {
        EntityStream::new(self.entities.subscribe())
    }

    /// Drop every entity, e.g. before re-attaching to a new client.
    pub fn clear(&self) {
        self.entities.clear();
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        *self.last_event.borrow()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
