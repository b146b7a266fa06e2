//! Net-IDS Core - Main Entry Point
//!
//! Bootstraps the detection engine and consumes decoded flow events from
//! the capture collaborator, one NDJSON line per event on stdin.

mod constants;
mod logic;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use logic::alerts::AlertSink;
use logic::config::EngineConfig;
use logic::engine::Engine;
use logic::events::FlowEvent;
use logic::model::ModelLifecycle;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} v{}...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let config = EngineConfig::from_env();
    log::info!(
        "Window: {}s | port scan >= {} ports | syn burst >= {} SYNs | alert log: {:?}",
        config.window_seconds,
        config.port_scan_threshold,
        config.syn_rate_threshold,
        config.alert_log_path
    );
    log::info!(
        "Collecting baseline for {}s ({} samples minimum). Feed normal traffic to train.",
        config.training.interval_secs,
        config.training.min_samples
    );

    let lifecycle = Arc::new(ModelLifecycle::new(config.training.clone()));
    let trainer = logic::trainer::spawn(
        lifecycle.clone(),
        Duration::from_secs(config.trainer_poll_secs),
    );

    let sink = AlertSink::new(config.alert_log_path.clone());
    let mut engine = Engine::new(&config, lifecycle, sink);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match FlowEvent::from_json_line(&line) {
                    Ok(event) => {
                        engine.process_event(&event);
                    }
                    Err(e) => log::debug!("Skipping malformed event: {}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("Event stream read error: {}", e);
                break;
            }
        }
    }

    let status = engine.status();
    log::info!(
        "Event stream closed: {} events processed, {} skipped, {} alerts emitted",
        status.events_processed,
        status.events_skipped,
        status.alerts_emitted
    );

    trainer.abort();
}
