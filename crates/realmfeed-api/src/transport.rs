//! Live transport: one outbound streaming connection per attempt.
//!
//! A [`Transport`] opens a connection and hands back a [`FrameStream`] of
//! raw text frames. The stream ending (`None`) is a clean disconnect; an
//! `Err` item is a broken connection and is always the last item yielded.
//! Retry, timeout, and fallback policy live in `realmfeed-core`; this layer
//! only establishes and reads.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use realmfeed_api::{Transport, WebSocketTransport};
//! use url::Url;
//!
//! let endpoint = Url::parse("ws://127.0.0.1:9001/feed")?;
//! let mut frames = WebSocketTransport::new().open(&endpoint).await?;
//!
//! while let Some(Ok(text)) = frames.next().await {
//!     println!("{text}");
//! }
//! ```

use std::pin::Pin;

use futures_core::Stream;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, protocol::frame::coding::CloseCode};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;

/// Text frames from an established connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Something that can open a live connection to an endpoint.
///
/// The returned future resolves once the connection is established (or has
/// failed). Dropping the future aborts the attempt; dropping the stream
/// closes the connection.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, endpoint: &Url) -> BoxFuture<'static, Result<FrameStream, Error>>;
}

// ── WebSocketTransport ───────────────────────────────────────────────

/// [`Transport`] over `tokio-tungstenite`. Accepts `ws://` and `wss://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, endpoint: &Url) -> BoxFuture<'static, Result<FrameStream, Error>> {
        let endpoint = endpoint.clone();
        Box::pin(async move {
            if !matches!(endpoint.scheme(), "ws" | "wss") {
                return Err(Error::UnsupportedScheme(endpoint.scheme().to_owned()));
            }

            tracing::info!(url = %endpoint, "Connecting to WebSocket");

            let (ws_stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

            tracing::info!(url = %endpoint, "WebSocket connected");
            Ok(text_frames(ws_stream))
        })
    }
}

// ── Frame reading ────────────────────────────────────────────────────

/// Adapt a connected socket into a stream of text frames.
///
/// The write half is held inside the stream so the connection stays whole
/// (tungstenite answers pings through it) until the stream is dropped.
fn text_frames(ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> FrameStream {
    Box::pin(async_stream::stream! {
        let (_write, mut read) = ws_stream.split();

        while let Some(frame) = read.next().await {
            match frame {
                Ok(tungstenite::Message::Text(text)) => {
                    yield Ok(text.as_str().to_owned());
                }
                Ok(tungstenite::Message::Ping(_)) => {
                    tracing::trace!("WebSocket ping");
                }
                Ok(tungstenite::Message::Close(frame)) => {
                    match frame {
                        Some(cf) if cf.code != CloseCode::Normal => {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason.as_str(),
                                "WebSocket close frame received"
                            );
                            yield Err(Error::WebSocketClosed {
                                code: u16::from(cf.code),
                                reason: cf.reason.as_str().to_owned(),
                            });
                        }
                        _ => tracing::info!("WebSocket closed normally"),
                    }
                    break;
                }
                Err(e) => {
                    yield Err(Error::WebSocketConnect(e.to_string()));
                    break;
                }
                Ok(_) => {
                    // Binary, Pong, Frame -- ignore
                }
            }
        }

        tracing::debug!("WebSocket frame stream ended");
    })
}

// ── Tests ────────────────────────────────────────────────────────────
