//! Output formatting: event lines, entity tables, config tables.
//!
//! Events stream to stdout one per line, either as JSON (same shape the
//! core emits) or as a colored human-readable line. Tables use `tabled`.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use realmfeed_config::Config;
use realmfeed_core::{ConnectionState, Entity, FeedEvent, Realm};

use crate::cli::{ColorMode, EventFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_realm(realm: Realm, color: bool) -> String {
    let label = format!("{:<5}", realm.to_string());
    if !color {
        return label;
    }
    match realm {
        Realm::Ember => label.red().to_string(),
        Realm::Tide => label.blue().to_string(),
        Realm::Grove => label.green().to_string(),
        Realm::Gale => label.cyan().to_string(),
        Realm::Stone => label.yellow().to_string(),
        Realm::Void => label.magenta().to_string(),
    }
}

fn paint_state(state: ConnectionState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        ConnectionState::Open => label.green().bold().to_string(),
        ConnectionState::Mock => label.magenta().bold().to_string(),
        ConnectionState::Closed => label.red().to_string(),
        ConnectionState::Connecting => label.yellow().to_string(),
        ConnectionState::Idle => label.dimmed().to_string(),
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S%.3f").to_string()
}

// ── Events ───────────────────────────────────────────────────────────

/// Render one event as a single output line.
pub fn format_event(event: &FeedEvent, format: EventFormat, color: bool) -> Result<String, CliError> {
    if format == EventFormat::Json {
        return Ok(serde_json::to_string(event)?);
    }

    let line = match event {
        FeedEvent::ConnectionChanged { state, using_mock } => {
            let suffix = if *using_mock { " (synthetic feed)" } else { "" };
            format!(
                "{} {:<7} {}{suffix}",
                clock(Utc::now()),
                "state",
                paint_state(*state, color)
            )
        }
        FeedEvent::EntityUpsert(entity) => {
            let [x, y, z] = entity.coordinate.0;
            format!(
                "{} {:<7} {:<14} {} ({x:>8.2}, {y:>8.2}, {z:>8.2})",
                clock(entity.updated_at),
                "upsert",
                entity.id,
                paint_realm(entity.realm, color),
            )
        }
        FeedEvent::EntityRemoved { id } => {
            format!("{} {:<7} {id}", clock(Utc::now()), "remove")
        }
    };
    Ok(line)
}

/// Write a line to stdout.
pub fn write_line(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = write_line(output);
}

// ── Tables ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Realm")]
    realm: String,
    #[tabled(rename = "X")]
    x: String,
    #[tabled(rename = "Y")]
    y: String,
    #[tabled(rename = "Z")]
    z: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        let [x, y, z] = e.coordinate.0;
        Self {
            id: e.id.to_string(),
            realm: e.realm.to_string(),
            x: format!("{x:.2}"),
            y: format!("{y:.2}"),
            z: format!("{z:.2}"),
            updated: clock(e.updated_at),
        }
    }
}

pub fn render_entities(entities: &[Arc<Entity>]) -> String {
    let rows: Vec<EntityRow> = entities.iter().map(|e| EntityRow::from(e.as_ref())).collect();
    render_table(&rows)
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn setting(key: &str, value: impl ToString) -> SettingRow {
    SettingRow {
        key: key.into(),
        value: value.to_string(),
    }
}

pub fn render_config(cfg: &Config) -> String {
    let domain = cfg
        .coordinate_domain
        .iter()
        .map(|b| format!("[{}, {}]", b.min, b.max))
        .collect::<Vec<_>>()
        .join(" ");

    let rows = vec![
        setting("endpoint", &cfg.endpoint),
        setting("attempt_timeout_ms", cfg.attempt_timeout_ms),
        setting("max_retries", cfg.max_retries),
        setting("backoff_base_ms", cfg.backoff_base_ms),
        setting("backoff_max_ms", cfg.backoff_max_ms),
        setting("mock_cadence_ms", cfg.mock_cadence_ms),
        setting("population_ceiling", cfg.population_ceiling),
        setting("population_floor", cfg.population_floor),
        setting("spawn_batch", cfg.spawn_batch),
        setting("max_step_fraction", cfg.max_step_fraction),
        setting("seed", cfg.seed.map_or_else(|| "-".into(), |s| s.to_string())),
        setting("coordinate_domain", domain),
    ];
    render_table(&rows)
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
