// ── Core error types ──
//
// None of these are fatal and none reach callers of the control surface.
// They exist so failures are logged with a stable classification:
// transport problems drive the retry path, malformed messages are dropped,
// and listener failures stop at the emitter.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Live source ──────────────────────────────────────────────────
    #[error("Live transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    // ── Delivery ─────────────────────────────────────────────────────
    #[error("Listener failed: {reason}")]
    ListenerFailure { reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<realmfeed_api::Error> for CoreError {
    fn from(err: realmfeed_api::Error) -> Self {
        match err {
            realmfeed_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid endpoint URL: {e}"),
            },
            realmfeed_api::Error::UnsupportedScheme(scheme) => CoreError::Config {
                message: format!("Unsupported endpoint scheme '{scheme}' (expected ws or wss)"),
            },
            realmfeed_api::Error::WebSocketConnect(reason) => CoreError::TransportUnavailable {
                reason: format!("WebSocket connection failed: {reason}"),
            },
            realmfeed_api::Error::WebSocketClosed { code, reason } => {
                CoreError::TransportUnavailable {
                    reason: format!("WebSocket closed (code {code}): {reason}"),
                }
            }
            realmfeed_api::Error::Timeout { timeout_ms } => CoreError::TransportUnavailable {
                reason: format!("no connection within {timeout_ms}ms"),
            },
            realmfeed_api::Error::Malformed { message, body: _ } => {
                CoreError::MalformedMessage { reason: message }
            }
        }
    }
}
