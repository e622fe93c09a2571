//! Connection lifecycle, synthetic fallback, and event fan-out for realmfeed.
//!
//! A consumer renders a continuously updating set of entities in a
//! multi-axis space and should never notice whether the data is live:
//!
//! - **[`FeedClient`]**: Public handle. [`connect()`](FeedClient::connect),
//!   [`disconnect()`](FeedClient::disconnect), and
//!   [`force_mock()`](FeedClient::force_mock) enqueue commands for the
//!   connection manager task, which owns the `idle / connecting / open /
//!   closed / mock` state machine, the per-attempt timeout, and the retry
//!   budget.
//!
//! - **[`Synthesizer`]**: Stand-in data source. Starts when the retry
//!   budget is exhausted (or mock mode is forced) and emits entities in the
//!   same shape as live data, with a bounded population.
//!
//! - **[`Emitter`]**: Synchronous fan-out of [`FeedEvent`]s. A failing
//!   listener is isolated from the rest.
//!
//! - **[`EntityStore`]** / **[`EntityStream`]**: Optional consumer-side
//!   fold of the event stream into the active entity set, backed by
//!   `DashMap` and `tokio::sync::watch`.
//!
//! - **Domain model** ([`model`]): [`Entity`], [`Coordinate`], [`Realm`],
//!   [`ConnectionState`], [`FeedEvent`].

pub mod budget;
pub mod client;
pub mod config;
pub mod convert;
pub mod emitter;
pub mod error;
mod manager;
pub mod model;
pub mod store;
pub mod stream;
pub mod synth;
mod timer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use budget::{RetryBudget, RetryDecision, calculate_backoff};
pub use client::FeedClient;
pub use config::{FeedConfig, SynthConfig};
pub use emitter::{Emitter, Subscription};
pub use error::CoreError;
pub use store::EntityStore;
pub use stream::{EntityStream, Snapshot};
pub use synth::{Population, Synthesizer};

pub use model::{
    AXES, AxisBounds, ConnectionState, Coordinate, CoordinateDomain, Entity, EntityId, FeedEvent,
    Realm,
};

// Transport seam, for callers supplying their own live source.
pub use realmfeed_api::{FrameStream, Transport, WebSocketTransport};
