// ── Domain model ──
//
// Canonical entity and event types. Live and synthetic data both end up
// in these shapes, so consumers never care where an update came from.

pub mod entity;
pub mod event;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity::{AXES, AxisBounds, Coordinate, CoordinateDomain, Entity, EntityId, Realm};
pub use event::{ConnectionState, FeedEvent};
