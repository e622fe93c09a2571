//! Wire format of the live push source.
//!
//! Every text frame carries either a single message, a bare JSON array of
//! messages, or a `{ "data": [...] }` envelope. Each message is tagged by
//! `type`:
//!
//! ```json
//! { "type": "upsert", "id": "e1", "coordinate": [1.0, -4.5, 12.0], "realm": "tide", "timestamp": 1760000000000 }
//! { "type": "remove", "id": "e1" }
//! ```
//!
//! Decoding here is structural only. Dimension, finiteness, and realm checks
//! belong to `realmfeed-core`, which owns the domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── LiveMessage ──────────────────────────────────────────────────────

/// One decoded message from the live source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// Create or update an entity.
    Upsert(WireUpsert),

    /// Remove an entity from the active set.
    #[serde(alias = "removal", alias = "delete")]
    Remove { id: String },
}

/// Raw upsert payload, as sent by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireUpsert {
    pub id: String,

    /// Position in the abstract multi-axis space.
    pub coordinate: Vec<f64>,

    /// Realm tag, e.g. `"ember"`, `"tide"`.
    #[serde(alias = "category")]
    pub realm: String,

    /// Epoch milliseconds. Receivers stamp their own clock when absent.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl LiveMessage {
    /// Identifier the message refers to.
    pub fn id(&self) -> &str {
        match self {
            Self::Upsert(upsert) => &upsert.id,
            Self::Remove { id } => id,
        }
    }
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Result of decoding one text frame.
///
/// A frame that parses as JSON never fails as a whole: messages that do not
/// match the wire shape land in `rejected` and the rest are still delivered.
#[derive(Debug, Default)]
pub struct DecodedFrame {
    pub messages: Vec<LiveMessage>,
    pub rejected: Vec<Error>,
}

/// Decode a text frame into its messages.
///
/// Returns [`Error::Malformed`] only when the frame is not JSON at all or
/// is an object with neither a `type` tag nor a `data` array.
pub fn decode_frame(text: &str) -> Result<DecodedFrame, Error> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Malformed {
        message: e.to_string(),
        body: text.to_owned(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) if !map.contains_key("type") => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Malformed {
                    message: "frame has neither a `type` tag nor a `data` array".into(),
                    body: text.to_owned(),
                });
            }
        },
        other => vec![other],
    };

    let mut frame = DecodedFrame::default();
    for item in items {
        match LiveMessage::deserialize(&item) {
            Ok(msg) => frame.messages.push(msg),
            Err(e) => frame.rejected.push(Error::Malformed {
                message: e.to_string(),
                body: item.to_string(),
            }),
        }
    }

    Ok(frame)
}

// ── Tests ────────────────────────────────────────────────────────────
