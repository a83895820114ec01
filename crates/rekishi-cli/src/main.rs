//! rekishi binary
//!
//! Inspect and scrub document histories stored as op-log JSON files.
//!
//! ## Usage
//!
//! ```bash
//! # Summarize a history
//! rekishi info history.json
//!
//! # Print the document at version 4
//! rekishi show history.json --at 4
//!
//! # Simulate a slider drag from version 10 through 3, 5, 7 at 50ms per tick
//! rekishi scrub history.json --from 10 --interval-ms 50 3 5 7
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=rekishi_travel=debug` to see each travel plan.

mod history;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rekishi_ops::Version;
use rekishi_travel::{TimeTravel, TravelConfig, TravelEvent};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::history::History;

/// Scrub through op-log document histories.
#[derive(Parser, Debug)]
#[command(name = "rekishi")]
#[command(about = "Inspect and scrub op-log document histories")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the version count and a one-line summary per op
    Info {
        /// History JSON file
        history: PathBuf,
    },

    /// Print the document as of a version
    Show {
        /// History JSON file
        history: PathBuf,

        /// Version to show (default: latest)
        #[arg(long)]
        at: Option<Version>,
    },

    /// Travel through a sequence of versions and report what settles
    Scrub {
        /// History JSON file
        history: PathBuf,

        /// Version to start at (default: latest)
        #[arg(long)]
        from: Option<Version>,

        /// Delay between travels, in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,

        /// RON config file for the controller
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the settle debounce, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Versions to travel to, in order
        #[arg(required = true)]
        targets: Vec<Version>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Info { history } => cmd_info(&History::load(&history)?),
        Command::Show { history, at } => cmd_show(&History::load(&history)?, at),
        Command::Scrub { history, from, interval_ms, config, debounce_ms, targets } => {
            let mut config = match config {
                Some(path) => TravelConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => TravelConfig::default(),
            };
            if let Some(ms) = debounce_ms {
                config = config.with_settle_debounce(Duration::from_millis(ms));
            }
            cmd_scrub(
                &History::load(&history)?,
                from,
                Duration::from_millis(interval_ms),
                config,
                &targets,
            )
            .await
        }
    }
}

fn cmd_info(history: &History) -> Result<()> {
    println!("versions: {}", history.log.len());
    println!("base: {}", serde_json::to_string(history.base.root())?);
    for line in history.summarize() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_show(history: &History, at: Option<Version>) -> Result<()> {
    let at = at.unwrap_or(history.log.len());
    let travel = TimeTravel::initialize(
        history.log.clone(),
        history.head.clone(),
        history.log.len(),
        at,
        TravelConfig::default(),
    )?;
    println!("{}", serde_json::to_string_pretty(travel.document().root())?);
    Ok(())
}

async fn cmd_scrub(
    history: &History,
    from: Option<Version>,
    interval: Duration,
    config: TravelConfig,
    targets: &[Version],
) -> Result<()> {
    let max = history.log.len();
    let from = from.unwrap_or(max);
    let mut travel = TimeTravel::initialize(history.log.clone(), history.head.clone(), max, from, config)?;
    let mut events = travel.subscribe();

    println!("start at {from} of {max}");

    let mut last = None;
    for (i, &target) in targets.iter().enumerate() {
        if i > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        last = Some(travel.travel_to(target)?);
    }

    if let Some(handle) = last {
        let outcome = handle.outcome().await;
        tracing::debug!(?outcome, "last travel finished");
    }

    for event in drain_events(&mut events) {
        match event {
            TravelEvent::VersionChanged { from, to } => println!("version {from} -> {to}"),
            TravelEvent::Settled { seq, version } => println!("settled {seq} at version {version}"),
        }
    }

    println!("{}", serde_json::to_string_pretty(travel.document().root())?);
    Ok(())
}

/// Collect every buffered event. Long scrubs overrun the channel; the
/// oldest events are dropped but draining continues to the newest.
fn drain_events(rx: &mut broadcast::Receiver<TravelEvent>) -> Vec<TravelEvent> {
    let mut drained = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => drained.push(event),
            Err(TryRecvError::Lagged(n)) => {
                warn!(lagged = n, "travel events dropped; raise event_capacity to keep them");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rekishi_ops::{Component, JsonDocument, JsonOp, OpLog};
    use rekishi_travel::TravelOutcome;
    use serde_json::json;

    fn counter(n: usize, capacity: usize) -> TimeTravel<JsonOp, JsonDocument> {
        let log: OpLog<JsonOp> =
            (0..n).map(|_| JsonOp::single(Component::number_add(["counter"], 1))).collect();
        TimeTravel::from_base(
            Arc::new(log),
            JsonDocument::new(json!({"counter": 0})),
            n,
            TravelConfig::default().with_event_capacity(capacity),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_survives_overrun_channel() {
        let mut travel = counter(10, 4);
        let mut events = travel.subscribe();

        let mut last = None;
        for i in 0..100 {
            last = Some(travel.travel_to(i % 10).unwrap());
        }
        assert_eq!(last.unwrap().outcome().await, TravelOutcome::Settled(9));

        let drained = drain_events(&mut events);
        assert!(!drained.is_empty());
        assert!(drained.len() <= 4);
        let settled: Vec<_> = drained
            .iter()
            .filter(|e| matches!(e, TravelEvent::Settled { .. }))
            .collect();
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0], TravelEvent::Settled { version: 9, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_within_capacity_keeps_everything() {
        let mut travel = counter(5, 64);
        let mut events = travel.subscribe();

        travel.travel_to(2).unwrap();
        let handle = travel.travel_to(4).unwrap();
        handle.outcome().await;

        let drained = drain_events(&mut events);
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], TravelEvent::VersionChanged { from: 5, to: 2 });
        assert!(matches!(drained[2], TravelEvent::Settled { version: 4, .. }));
    }
}
