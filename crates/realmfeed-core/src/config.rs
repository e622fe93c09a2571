// ── Runtime feed configuration ──
//
// These types describe *how* the client connects and how the synthetic
// fallback behaves. They never touch disk: the CLI (or any embedding
// application) builds a `FeedConfig` and hands it in.

use std::time::Duration;

use url::Url;

use crate::error::CoreError;
use crate::model::CoordinateDomain;

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_millis(8000);
pub const DEFAULT_MOCK_CADENCE: Duration = Duration::from_millis(150);

/// Configuration for a single feed client.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Live source address (`ws://` or `wss://`).
    pub endpoint: Url,
    /// Bound on time spent in `connecting`.
    pub attempt_timeout: Duration,
    /// Failed attempts tolerated before falling back to mock mode.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per failure.
    pub backoff_base: Duration,
    /// Upper bound on the retry delay.
    pub backoff_max: Duration,
    /// Synthetic fallback tuning.
    pub synth: SynthConfig,
}

impl FeedConfig {
    /// Defaults for everything but the endpoint.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            synth: SynthConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !matches!(self.endpoint.scheme(), "ws" | "wss") {
            return Err(CoreError::config(format!(
                "endpoint must be ws:// or wss://, got {}",
                self.endpoint
            )));
        }
        if self.max_retries == 0 {
            return Err(CoreError::config("max_retries must be at least 1"));
        }
        if self.backoff_base > self.backoff_max {
            return Err(CoreError::config(format!(
                "backoff base ({}ms) exceeds backoff max ({}ms)",
                self.backoff_base.as_millis(),
                self.backoff_max.as_millis()
            )));
        }
        self.synth.validate()
    }
}

/// Tuning for the entity synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Tick period.
    pub cadence: Duration,
    /// Hard cap on live synthetic entities.
    pub population_ceiling: usize,
    /// Below this count every tick spends its budget spawning.
    pub population_floor: usize,
    /// Maximum upserts (spawns + walks) per tick.
    pub spawn_batch: usize,
    /// Largest per-tick step on an axis, as a fraction of the axis span.
    pub max_step_fraction: f64,
    /// Bounds of the coordinate space.
    pub domain: CoordinateDomain,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_MOCK_CADENCE,
            population_ceiling: 80,
            population_floor: 50,
            spawn_batch: 8,
            max_step_fraction: 0.02,
            domain: CoordinateDomain::default(),
            seed: None,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.cadence.is_zero() {
            return Err(CoreError::config("mock cadence must be greater than zero"));
        }
        if self.population_ceiling == 0 {
            return Err(CoreError::config("population ceiling must be at least 1"));
        }
        if self.population_floor > self.population_ceiling {
            return Err(CoreError::config(format!(
                "population floor ({}) exceeds ceiling ({})",
                self.population_floor, self.population_ceiling
            )));
        }
        if !(self.max_step_fraction > 0.0 && self.max_step_fraction <= 1.0) {
            return Err(CoreError::config(format!(
                "max step fraction must be in (0, 1], got {}",
                self.max_step_fraction
            )));
        }
        for (axis, bounds) in self.domain.axes().iter().enumerate() {
            if !bounds.is_usable() {
                return Err(CoreError::config(format!(
                    "coordinate domain axis {axis} has invalid bounds [{}, {}]",
                    bounds.min, bounds.max
                )));
            }
        }
        Ok(())
    }
}
