//! Clap derive structures for the `realmfeed` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// realmfeed -- watch a live entity feed, falling back to synthetic data
#[derive(Debug, Parser)]
#[command(
    name = "realmfeed",
    version,
    about = "Watch a live entity feed, with automatic synthetic fallback",
    long_about = "Connects to a WebSocket entity feed and prints every update.\n\n\
        When the feed cannot be reached within the retry budget, a synthetic\n\
        feed takes over so downstream consumers keep receiving data.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'C', env = "REALMFEED_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Live feed endpoint, ws:// or wss:// (overrides config)
    #[arg(long, short = 'e', global = true)]
    pub endpoint: Option<String>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventFormat {
    /// One human-readable line per event
    Pretty,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and print feed events as they arrive
    Watch(WatchArgs),

    /// Inspect or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Skip the live feed and start in synthetic mode
    #[arg(long)]
    pub mock: bool,

    /// Stop after this long (e.g. "30s", "5m")
    #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Stop after printing this many events
    #[arg(long, short = 'n')]
    pub max_events: Option<usize>,

    /// Event output format
    #[arg(long, short = 'o', default_value = "pretty")]
    pub format: EventFormat,

    /// Seed for a reproducible synthetic feed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-attempt connection timeout (e.g. "2s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub attempt_timeout: Option<Duration>,

    /// Failed attempts before switching to the synthetic feed
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Print a table of active entities on exit
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (defaults + file + environment)
    Show {
        /// Print as TOML instead of a table
        #[arg(long)]
        toml: bool,
    },

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
