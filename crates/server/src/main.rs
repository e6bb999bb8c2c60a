//! Headless game server.
//!
//! Registers one demo session, lets a scripted driver play every turn, and
//! prints each session event to stdout as a JSON line. Logs go to stderr.
//!
//! # Environment
//!
//! - `GAME_CONFIG`: path to a RON [`RuntimeConfig`] file (optional)
//! - `TURN_DURATION_MS`, `TRANSITION_DURATION_MS`, `COMBAT_ROUND_MS`: timer overrides
//! - `DEMO_SEED`: seed for the scripted driver and the session dice
//! - `DEMO_MAX_TURNS`: stop after this many turns (default 20)
//! - `RUST_LOG`: log filter (default `info`)

mod demo;
mod driver;

use std::collections::HashMap;

use anyhow::{Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use game_core::SessionEvent;
use runtime::{Runtime, RuntimeConfig, Topic};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    setup_logging();

    let config = load_config()?;
    info!(
        turn_ms = config.turn_duration.as_millis() as u64,
        transition_ms = config.transition_duration.as_millis() as u64,
        combat_round_ms = config.combat_round_interval.as_millis() as u64,
        "runtime config loaded"
    );

    let seed = read_env("DEMO_SEED").unwrap_or(7);
    let max_turns = read_env("DEMO_MAX_TURNS").unwrap_or(20);

    let runtime = Runtime::builder().config(config).build();
    let printer = tokio::spawn(print_events(
        runtime.handle().subscribe_multiple(&Topic::ALL),
    ));

    let (session, layout) = demo::session(seed)?;
    let handle = runtime.register_session(session, layout)?;
    info!(session = %handle.id(), "demo session registered");

    driver::ScriptedDriver::new(handle, runtime.subscribe(Topic::Turn), seed)
        .run(max_turns)
        .await?;

    // Dropping the runtime closes the event bus, which ends the printer.
    runtime.shutdown().await?;
    printer.await?;
    info!("server shutdown complete");
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<RuntimeConfig> {
    let config = match std::env::var("GAME_CONFIG") {
        Ok(path) => RuntimeConfig::load(&path)
            .with_context(|| format!("loading GAME_CONFIG from {path}"))?,
        Err(_) => RuntimeConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// Writes every event of every topic to stdout, one JSON document per line.
async fn print_events(receivers: HashMap<Topic, broadcast::Receiver<SessionEvent>>) {
    let mut tasks = Vec::new();
    for (topic, mut rx) in receivers {
        tasks.push(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(err) => warn!(%topic, error = %err, "failed to encode event"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%topic, skipped, "event printer lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
    for task in tasks {
        let _ = task.await;
    }
}
