//! Configuration for realmfeed clients.
//!
//! A flat TOML file layered with `REALMFEED_` environment variables, and
//! translation to `realmfeed_core::FeedConfig`. The CLI applies its own
//! flag overrides on top of what this crate loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use realmfeed_core::{AXES, AxisBounds, CoordinateDomain, CoreError, FeedConfig, SynthConfig};

/// Prefix for environment overrides, e.g. `REALMFEED_MAX_RETRIES=3`.
pub const ENV_PREFIX: &str = "REALMFEED_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// On-disk configuration. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Live source address (`ws://` or `wss://`).
    pub endpoint: String,

    pub attempt_timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,

    /// Synthesizer tick period.
    pub mock_cadence_ms: u64,
    pub population_ceiling: usize,
    pub population_floor: usize,
    pub spawn_batch: usize,
    pub max_step_fraction: f64,

    /// Fixed seed for a reproducible synthetic feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// One `{ min, max }` entry per axis.
    pub coordinate_domain: Vec<AxisBounds>,
}

impl Default for Config {
    fn default() -> Self {
        let synth = SynthConfig::default();
        Self {
            endpoint: "ws://127.0.0.1:9001/feed".into(),
            attempt_timeout_ms: millis(realmfeed_core::config::DEFAULT_ATTEMPT_TIMEOUT),
            max_retries: realmfeed_core::config::DEFAULT_MAX_RETRIES,
            backoff_base_ms: millis(realmfeed_core::config::DEFAULT_BACKOFF_BASE),
            backoff_max_ms: millis(realmfeed_core::config::DEFAULT_BACKOFF_MAX),
            mock_cadence_ms: millis(synth.cadence),
            population_ceiling: synth.population_ceiling,
            population_floor: synth.population_floor,
            spawn_batch: synth.spawn_batch,
            max_step_fraction: synth.max_step_fraction,
            seed: None,
            coordinate_domain: synth.domain.axes().to_vec(),
        }
    }
}

impl Config {
    /// Check values a TOML file or environment can get wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.parse_endpoint()?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(ConfigError::validation(
                "endpoint",
                format!("expected ws:// or wss://, got {}", endpoint.scheme()),
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::validation("max_retries", "must be at least 1"));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::validation(
                "backoff_base_ms",
                format!(
                    "{} exceeds backoff_max_ms ({})",
                    self.backoff_base_ms, self.backoff_max_ms
                ),
            ));
        }
        if self.mock_cadence_ms == 0 {
            return Err(ConfigError::validation("mock_cadence_ms", "must be greater than zero"));
        }
        if self.population_ceiling == 0 {
            return Err(ConfigError::validation("population_ceiling", "must be at least 1"));
        }
        if self.population_floor > self.population_ceiling {
            return Err(ConfigError::validation(
                "population_floor",
                format!(
                    "{} exceeds population_ceiling ({})",
                    self.population_floor, self.population_ceiling
                ),
            ));
        }
        if !(self.max_step_fraction > 0.0 && self.max_step_fraction <= 1.0) {
            return Err(ConfigError::validation(
                "max_step_fraction",
                format!("must be in (0, 1], got {}", self.max_step_fraction),
            ));
        }
        self.domain().map(|_| ())
    }

    /// Translate into the runtime configuration consumed by `FeedClient`.
    pub fn to_feed_config(&self) -> Result<FeedConfig, ConfigError> {
        self.validate()?;

        let mut feed = FeedConfig::new(self.parse_endpoint()?);
        feed.attempt_timeout = Duration::from_millis(self.attempt_timeout_ms);
        feed.max_retries = self.max_retries;
        feed.backoff_base = Duration::from_millis(self.backoff_base_ms);
        feed.backoff_max = Duration::from_millis(self.backoff_max_ms);
        feed.synth = SynthConfig {
            cadence: Duration::from_millis(self.mock_cadence_ms),
            population_ceiling: self.population_ceiling,
            population_floor: self.population_floor,
            spawn_batch: self.spawn_batch,
            max_step_fraction: self.max_step_fraction,
            domain: self.domain()?,
            seed: self.seed,
        };

        feed.validate()?;
        Ok(feed)
    }

    fn parse_endpoint(&self) -> Result<url::Url, ConfigError> {
        self.endpoint
            .parse()
            .map_err(|e| ConfigError::validation("endpoint", format!("{e}: {}", self.endpoint)))
    }

    fn domain(&self) -> Result<CoordinateDomain, ConfigError> {
        let axes: [AxisBounds; AXES] =
            self.coordinate_domain.as_slice().try_into().map_err(|_| {
                ConfigError::validation(
                    "coordinate_domain",
                    format!(
                        "expected {AXES} axes, got {}",
                        self.coordinate_domain.len()
                    ),
                )
            })?;

        for (axis, bounds) in axes.iter().enumerate() {
            if !bounds.is_usable() {
                return Err(ConfigError::validation(
                    "coordinate_domain",
                    format!(
                        "axis {axis} bounds [{}, {}] must be ordered with a finite span",
                        bounds.min, bounds.max
                    ),
                ));
            }
        }
        Ok(CoordinateDomain(axes))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "realmfeed", "realmfeed").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("realmfeed");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Provider chain: defaults, then the TOML file at `path`, then
/// `REALMFEED_*` environment variables.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
