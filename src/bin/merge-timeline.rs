// Copyright (c) 2025 - Cowboy AI, Inc.
//! Merge Timeline
//!
//! Runs a concurrency-bounded merge on a virtual clock and prints the merged
//! notifications as JSON lines.
//!
//! Every scenario value arrives at t = 0 and is mapped to a child stream
//! that emits the value after its delay, then ends.
//!
//! Run with: cargo run --bin merge-timeline
//!
//! Environment:
//! - MERGE_CONCURRENCY: concurrency bound (default: 1)
//! - MERGE_SCENARIO: path to a JSON file `[{"value": "A", "delay": 30}, ...]`
//!   (default: A/30, B/10, C/5)

use anyhow::{Context, Result};
use cim_frp_merge::testing::{timeline, RecordingSink, ScriptedStream, VirtualScheduler};
use cim_frp_merge::{merge_map_with, MergeConfig, Notification, Time};
use serde::Deserialize;
use tracing::{debug, info};

/// One value of the scenario and how long its child stream runs
#[derive(Debug, Clone, Deserialize)]
struct ScenarioEntry {
    value: String,
    delay: Time,
}

fn default_scenario() -> Vec<ScenarioEntry> {
    [("A", 30), ("B", 10), ("C", 5)]
        .into_iter()
        .map(|(value, delay)| ScenarioEntry {
            value: value.to_string(),
            delay,
        })
        .collect()
}

fn load_scenario() -> Result<Vec<ScenarioEntry>> {
    match std::env::var("MERGE_SCENARIO") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read scenario file {}", path))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse scenario file {}", path))
        }
        Err(_) => Ok(default_scenario()),
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = MergeConfig::from_env().context("Invalid merge configuration")?;
    let scenario = load_scenario()?;
    info!(
        concurrency = config.concurrency(),
        values = scenario.len(),
        "Running merge scenario"
    );

    let mut script: Vec<Notification<ScenarioEntry>> = scenario
        .into_iter()
        .map(|entry| Notification::Event { time: 0, value: entry })
        .collect();
    script.push(Notification::End { time: 0 });

    let merged = merge_map_with(
        config,
        |entry: ScenarioEntry| {
            debug!(value = %entry.value, delay = entry.delay, "Mapping value");
            Ok(ScriptedStream::delayed(entry.delay, entry.value).into_stream())
        },
        timeline(script),
    );

    let scheduler = VirtualScheduler::new();
    let sink = RecordingSink::new();
    let _handle = merged.run(sink.clone(), scheduler.handle());
    scheduler.run();

    for notification in sink.notifications() {
        println!("{}", serde_json::to_string(&notification)?);
    }

    info!(finished_at = scheduler.now(), "Scenario complete");
    Ok(())
}
