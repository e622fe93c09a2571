// ── Emitted events and connection state ──

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};

/// Lifecycle state of the live connection.
///
/// Exactly one value holds per client. Only the connection manager moves it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
    Mock,
}

impl ConnectionState {
    pub fn is_mock(self) -> bool {
        self == Self::Mock
    }
}

/// Everything consumers receive, from either source.
///
/// Serialized with a kebab-case `kind` tag:
/// `connection-changed`, `entity-upsert`, `entity-removed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FeedEvent {
    #[serde(rename_all = "camelCase")]
    ConnectionChanged {
        state: ConnectionState,
        using_mock: bool,
    },
    EntityUpsert(Entity),
    EntityRemoved { id: EntityId },
}

impl FeedEvent {
    pub fn connection_changed(state: ConnectionState) -> Self {
        Self::ConnectionChanged {
            state,
            using_mock: state.is_mock(),
        }
    }

    /// The `kind` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionChanged { .. } => "connection-changed",
            Self::EntityUpsert(_) => "entity-upsert",
            Self::EntityRemoved { .. } => "entity-removed",
        }
    }

    /// The entity this event refers to, if any.
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Self::EntityUpsert(entity) => Some(&entity.id),
            Self::EntityRemoved { id } => Some(id),
            Self::ConnectionChanged { .. } => None,
        }
    }
}
