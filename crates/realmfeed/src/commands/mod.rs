//! Subcommand handlers.

pub mod config_cmd;
pub mod watch;

use std::path::PathBuf;

use crate::cli::GlobalOpts;

/// Config file in effect: `--config` / `REALMFEED_CONFIG`, else the
/// platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(realmfeed_config::config_path)
}
