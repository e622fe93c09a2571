// ── Wire → domain conversion ──
//
// Live messages arrive structurally decoded by `realmfeed-api`. Here they
// are validated against the same entity shape the synthesizer produces.

use chrono::{DateTime, Utc};

use realmfeed_api::{LiveMessage, WireUpsert};

use crate::error::CoreError;
use crate::model::{AXES, Coordinate, Entity, EntityId, FeedEvent, Realm};

/// Validate a raw upsert into an [`Entity`].
///
/// `received_at` stamps entities whose message carried no timestamp.
pub fn entity_from_wire(upsert: WireUpsert, received_at: DateTime<Utc>) -> Result<Entity, CoreError> {
    if upsert.id.trim().is_empty() {
        return Err(CoreError::malformed("upsert with empty id"));
    }

    let coordinate = Coordinate::try_from(upsert.coordinate.as_slice()).map_err(|len| {
        CoreError::malformed(format!(
            "entity {}: coordinate has {len} axes, expected {AXES}",
            upsert.id
        ))
    })?;
    if !coordinate.is_finite() {
        return Err(CoreError::malformed(format!(
            "entity {}: coordinate has non-finite values",
            upsert.id
        )));
    }

    let realm: Realm = upsert.realm.parse().map_err(|_| {
        CoreError::malformed(format!(
            "entity {}: unknown realm '{}'",
            upsert.id, upsert.realm
        ))
    })?;

    let updated_at = match upsert.timestamp {
        Some(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| {
            CoreError::malformed(format!(
                "entity {}: timestamp {ms} out of range",
                upsert.id
            ))
        })?,
        None => received_at,
    };

    Ok(Entity {
        id: EntityId::from(upsert.id),
        coordinate,
        realm,
        updated_at,
    })
}

/// Convert a live message into the event consumers receive.
pub fn event_from_live(msg: LiveMessage, received_at: DateTime<Utc>) -> Result<FeedEvent, CoreError> {
    match msg {
        LiveMessage::Upsert(upsert) => {
            entity_from_wire(upsert, received_at).map(FeedEvent::EntityUpsert)
        }
        LiveMessage::Remove { id } if id.trim().is_empty() => {
            Err(CoreError::malformed("removal with empty id"))
        }
        LiveMessage::Remove { id } => Ok(FeedEvent::EntityRemoved {
            id: EntityId::from(id),
        }),
    }
}
