use thiserror::Error;

/// Top-level error type for the `realmfeed-api` crate.
///
/// Covers every failure mode of the live source: endpoint parsing,
/// WebSocket establishment and teardown, and frame decoding.
/// `realmfeed-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint is not a `ws://` or `wss://` address.
    #[error("Unsupported endpoint scheme '{0}' (expected ws or wss)")]
    UnsupportedScheme(String),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the remote with a close frame.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// No establishment signal within the per-attempt bound.
    #[error("Connection attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// A frame or message could not be decoded, with the raw body for debugging.
    #[error("Malformed message: {message}")]
    Malformed { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this error came from decoding rather than the transport.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_transient() {
        assert!(Error::WebSocketConnect("refused".into()).is_transient());
        assert!(Error::Timeout { timeout_ms: 2000 }.is_transient());
        assert!(
            Error::WebSocketClosed {
                code: 1001,
                reason: "going away".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn endpoint_and_decode_failures_are_not_transient() {
        assert!(!Error::UnsupportedScheme("http".into()).is_transient());
        let malformed = Error::Malformed {
            message: "bad".into(),
            body: "{}".into(),
        };
        assert!(!malformed.is_transient());
        assert!(malformed.is_malformed());
    }
}
