//! Simulation binary for Hearth.
//!
//! Wires together configuration, logging, the goal oracle, operator input
//! and the tick loop, then runs until the tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `HEARTH_CONFIG` (default `hearth.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the world and the cognition scheduler
//! 4. Select the goal oracle (`rules` or `llm`)
//! 5. Start the whisper reader, event logger and Ctrl-C handler
//! 6. Run the simulation loop
//! 7. Log the result
//!
//! Each line typed on stdin becomes a whisper: a directive attached to every
//! survivor's snapshot until it expires. An empty line clears it.

mod error;
mod oracle;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use hearth_core::config::{HearthConfig, LogFormat, LoggingConfig};
use hearth_core::runner::{self, Controls, Simulation, SimulationResult};
use hearth_types::EventEnvelope;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::oracle::EngineOracle;
use crate::status::StatusCallback;

/// Config path used when `HEARTH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "hearth.yaml";

/// Capacity of the presentation event fan-out.
const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// Capacity of the whisper queue.
const WHISPER_CHANNEL_CAPACITY: usize = 16;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging or oracle setup fails, or if
/// the simulation loop aborts.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("HEARTH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = HearthConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_logging(&config.logging).context("initializing logging")?;
    info!(
        config = %config_path.display(),
        tick_interval_ms = config.simulation.tick_interval_ms,
        agent_count = config.simulation.agent_count,
        pacing = ?config.presets.pacing,
        abundance = ?config.presets.abundance,
        oracle = ?config.oracle.backend,
        tactics = ?config.cognition.tactics,
        "hearth-engine starting"
    );

    let result = run(config).await.context("running simulation")?;
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "hearth-engine shutdown complete"
    );
    Ok(())
}

/// Build everything and drive the loop to completion.
async fn run(config: HearthConfig) -> Result<SimulationResult, EngineError> {
    let oracle = Arc::new(EngineOracle::from_config(config.oracle.backend)?);

    let mut sim = Simulation::new(config);
    info!(
        seed = sim.seed(),
        agents = sim.world.agents.len(),
        resources = sim.world.resources.len(),
        "World populated"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (whisper_tx, whisper_rx) = mpsc::channel(WHISPER_CHANNEL_CAPACITY);
    let (events_tx, events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(shutdown_on_ctrl_c(shutdown_tx));
    tokio::spawn(read_whispers(whisper_tx));
    tokio::spawn(log_events(events_rx));

    let controls = Controls {
        shutdown: shutdown_rx,
        whispers: Some(whisper_rx),
        events: events_tx,
    };
    let mut callback = StatusCallback::new();
    let result = runner::run_simulation(&mut sim, oracle, controls, &mut callback).await?;
    Ok(result)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log level {}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

async fn shutdown_on_ctrl_c(shutdown: watch::Sender<bool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl-C received, stopping simulation");
            if shutdown.send(true).is_err() {
                debug!("Simulation already stopped");
            }
        }
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

/// Forward stdin lines as whispers until stdin closes.
async fn read_whispers(whispers: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if whispers.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed, whisper input disabled");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read whisper from stdin");
                break;
            }
        }
    }
}

/// Log every presentation event as one JSON field.
async fn log_events(mut events: broadcast::Receiver<EventEnvelope>) {
    loop {
        match events.recv().await {
            Ok(envelope) => match serde_json::to_string(&envelope.event) {
                Ok(json) => info!(
                    sequence = envelope.sequence,
                    sim_time_ms = envelope.sim_time_ms,
                    event = %json,
                    "Presentation event"
                ),
                Err(e) => warn!(error = %e, "Failed to serialize presentation event"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger lagging, events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
