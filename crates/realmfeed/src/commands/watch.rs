//! `watch`: run a feed client and stream its events to stdout.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use realmfeed_config as config;
use realmfeed_core::{EntityStore, FeedClient, FeedConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::commands::config_file;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let feed = build_feed_config(&args, global)?;
    let color = output::should_color(global.color);

    let client = FeedClient::websocket(feed)?;
    let store = Arc::new(EntityStore::new());
    let _attached = store.attach(client.emitter());
    let (_subscription, mut events) = client.subscribe_channel();

    if args.mock {
        client.force_mock(true);
    } else {
        client.connect();
    }
    debug!(endpoint = %client.config().endpoint, mock = args.mock, "watch started");

    let deadline = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = &mut interrupted => {
                debug!("interrupted");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if !global.quiet {
                    let line = output::format_event(&event, args.format, color)?;
                    match output::write_line(&line) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::BrokenPipe => break,
                        Err(e) => return Err(e.into()),
                    }
                }
                printed += 1;
                if args.max_events.is_some_and(|max| printed >= max) {
                    break;
                }
            }
        }
    }

    // Capture before shutdown retires the synthetic population.
    let snapshot = store.snapshot();
    let final_state = client.state();
    client.shutdown();
    info!(
        events = printed,
        entities = snapshot.len(),
        state = %final_state,
        "watch finished"
    );

    if args.summary {
        output::print_output(&output::render_entities(&snapshot), global.quiet);
    }
    Ok(())
}

/// Config file + environment, then command-line overrides.
fn build_feed_config(args: &WatchArgs, global: &GlobalOpts) -> Result<FeedConfig, CliError> {
    let path = config_file(global);
    let mut cfg = config::load_config_from(&path).map_err(|e| CliError::from_config(e, &path))?;

    if let Some(endpoint) = &global.endpoint {
        cfg.endpoint.clone_from(endpoint);
    }
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(timeout) = args.attempt_timeout {
        cfg.attempt_timeout_ms = millis(timeout);
    }
    if let Some(max_retries) = args.max_retries {
        cfg.max_retries = max_retries;
    }

    cfg.to_feed_config().map_err(|e| match e {
        config::ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
        other => CliError::from_config(other, &path),
    })
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
