// ── Reactive entity collection ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Entity, EntityId};

/// The active entity set.
///
/// Every mutation bumps a version counter and rebuilds the snapshot that
/// subscribers receive. Snapshots are ordered by id.
pub(crate) struct EntityCollection {
    by_id: DashMap<EntityId, Arc<Entity>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<Entity>>>>,
}

impl EntityCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, entity: Entity) -> bool {
        let is_new = self
            .by_id
            .insert(entity.id.clone(), Arc::new(entity))
            .is_none();

        self.rebuild_snapshot();
        self.bump_version();

        is_new
    }

    /// Remove an entity. Unknown ids are ignored and do not notify.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<Entity>> {
        let removed = self.by_id.remove(id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Entity>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Entity>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        if self.by_id.is_empty() {
            return;
        }
        self.by_id.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<Entity>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{Coordinate, Realm};

    fn entity(id: &str, x: f64) -> Entity {
        Entity {
            id: EntityId::from(id),
            coordinate: Coordinate([x, 0.0, 0.0]),
            realm: Realm::Ember,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_reports_new_ids_only() {
        let col = EntityCollection::new();
        assert!(col.upsert(entity("a", 1.0)));
        assert!(!col.upsert(entity("a", 2.0)));
        assert_eq!(col.len(), 1);
        assert_eq!(
            col.get(&"a".into()).unwrap().coordinate,
            Coordinate([2.0, 0.0, 0.0])
        );
    }

    #[test]
    fn remove_unknown_id_does_not_bump_version() {
        let col = EntityCollection::new();
        col.upsert(entity("a", 1.0));
        let before = col.version();

        assert!(col.remove(&"zzz".into()).is_none());
        assert_eq!(col.version(), before);

        assert!(col.remove(&"a".into()).is_some());
        assert_eq!(col.version(), before + 1);
        assert!(col.get(&"a".into()).is_none());
    }

    #[test]
    fn snapshot_is_sorted_by_id() {
        let col = EntityCollection::new();
        col.upsert(entity("c", 0.0));
        col.upsert(entity("a", 0.0));
        col.upsert(entity("b", 0.0));

        let snap = col.snapshot();
        let ids: Vec<&str> = snap.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn clear_empties_everything() {
        let col = EntityCollection::new();
        col.upsert(entity("a", 0.0));
        col.upsert(entity("b", 0.0));

        col.clear();
        assert_eq!(col.len(), 0);
        assert!(col.snapshot().is_empty());
    }
}
