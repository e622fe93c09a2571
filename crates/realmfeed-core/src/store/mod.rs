// ── Consumer-side entity store ──
//
// Folds the emitted event stream into the active entity set so consumers
// can read snapshots or react to changes instead of replaying events.

mod collection;
mod entity_store;

pub use entity_store::EntityStore;
