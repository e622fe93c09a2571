//! CLI error types with miette diagnostics.
//!
//! Maps config and core errors into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use realmfeed_config::ConfigError;
use realmfeed_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration value for {field}: {reason}")]
    #[diagnostic(
        code(realmfeed::config_invalid),
        help(
            "Inspect the effective settings with: realmfeed config show\n\
             Config file: {path}"
        )
    )]
    InvalidConfig {
        field: String,
        reason: String,
        path: String,
    },

    #[error("Could not load configuration from {path}")]
    #[diagnostic(
        code(realmfeed::config_load),
        help("Fix the file, or reset it with: realmfeed config init --force")
    )]
    ConfigLoad {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(
        code(realmfeed::config_exists),
        help("Use --force (-f) to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(realmfeed::validation))]
    Validation { field: String, reason: String },

    // ── Feed ─────────────────────────────────────────────────────────
    #[error("Feed client error: {0}")]
    #[diagnostic(code(realmfeed::feed))]
    Feed(#[source] CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode event: {0}")]
    #[diagnostic(code(realmfeed::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode configuration: {0}")]
    #[diagnostic(code(realmfeed::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig { .. } | Self::ConfigLoad { .. } | Self::ConfigExists { .. } => {
                exit_code::CONFIG
            }
            Self::Validation { .. } => exit_code::USAGE,
            Self::Feed(CoreError::TransportUnavailable { .. }) => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the config file path to a loading/validation failure.
    pub fn from_config(err: ConfigError, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err {
            ConfigError::Validation { field, reason } => Self::InvalidConfig {
                field,
                reason,
                path,
            },
            ConfigError::Core(CoreError::Config { message }) => Self::InvalidConfig {
                field: "feed".into(),
                reason: message,
                path,
            },
            source => Self::ConfigLoad { path, source },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            other => CliError::Feed(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn config_errors_carry_path_and_exit_code() {
        let err = CliError::from_config(
            ConfigError::Validation {
                field: "max_retries".into(),
                reason: "must be at least 1".into(),
            },
            Path::new("/etc/realmfeed.toml"),
        );
        assert_eq!(err.exit_code(), exit_code::CONFIG);
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn transport_errors_map_to_connection_exit_code() {
        let err = CliError::from(CoreError::TransportUnavailable {
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err = CliError::from(CoreError::Config {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
