//! Detection Engine - Ingestion Pipeline
//!
//! The explicit context object driving the per-event path:
//! record → prune → extract → collect-or-score → rules → alert sink.
//! Owns the window store and the sink; shares the model lifecycle with the
//! trainer task. One event at a time, never blocking beyond the lifecycle's
//! bounded critical section.

use std::sync::Arc;

use serde::Serialize;

use crate::logic::alerts::{Alert, AlertSink, SinkStats};
use crate::logic::config::EngineConfig;
use crate::logic::events::FlowEvent;
use crate::logic::features;
use crate::logic::features::layout::LayoutInfo;
use crate::logic::model::{LifecycleState, ModelLifecycle, Observation};
use crate::logic::rules::{RuleConfig, RuleEvaluator};
use crate::logic::scorer::AnomalyScorer;
use crate::logic::window::{WindowEntry, WindowStore};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Idle-source eviction runs once per this many processed events
const EVICTION_CHECK_EVERY: u64 = 1024;

// ============================================================================
// STATUS
// ============================================================================

/// Snapshot of the engine for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: LifecycleState,
    pub buffered_samples: usize,
    pub tracked_sources: usize,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub alerts_emitted: u64,
    pub sink: SinkStats,
    pub feature_layout: LayoutInfo,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    windows: WindowStore,
    rules: RuleEvaluator,
    scorer: AnomalyScorer,
    lifecycle: Arc<ModelLifecycle>,
    sink: AlertSink,
    events_processed: u64,
    events_skipped: u64,
    alerts_emitted: u64,
}

impl Engine {
    pub fn new(config: &EngineConfig, lifecycle: Arc<ModelLifecycle>, sink: AlertSink) -> Self {
        Self {
            windows: WindowStore::new(
                config.window_seconds,
                config.max_entries_per_source,
                config.idle_source_timeout_secs,
            ),
            rules: RuleEvaluator::new(RuleConfig {
                port_scan_threshold: config.port_scan_threshold,
                syn_rate_threshold: config.syn_rate_threshold,
            }),
            scorer: AnomalyScorer::new(config.anomaly_score_threshold),
            lifecycle,
            sink,
            events_processed: 0,
            events_skipped: 0,
            alerts_emitted: 0,
        }
    }

    /// Push interface of the capture collaborator: one decoded event per call.
    /// Returns the emitted alert, if this event qualified for one.
    pub fn process_event(&mut self, event: &FlowEvent) -> Option<Alert> {
        if let Err(e) = event.validate() {
            self.events_skipped += 1;
            log::debug!("Skipping event: {}", e);
            return None;
        }

        self.windows.record(&event.source_address, WindowEntry::from(event));
        self.events_processed += 1;

        if self.events_processed % EVICTION_CHECK_EVERY == 0 {
            let evicted = self.windows.evict_idle(event.timestamp);
            if evicted > 0 {
                log::debug!("Evicted {} idle sources", evicted);
            }
        }

        let entries = self.windows.view(&event.source_address, event.timestamp);
        let vector = features::extract(entries);

        let model = match self.lifecycle.observe(&vector) {
            // Baseline collection: the vector is buffered, nothing is
            // alerted regardless of the feature values.
            Observation::Collecting { .. } => return None,
            Observation::Active(model) => model,
        };

        let reasons = self.rules.evaluate(&vector);
        let score = self.scorer.score(&model, &vector);

        if !self.scorer.should_alert(score, &reasons) {
            return None;
        }

        let alert = Alert::new(
            event.source_address.clone(),
            AnomalyScorer::reported_magnitude(score),
            reasons,
        );

        // Sink failures are surfaced inside the sink; ingestion continues
        let _ = self.sink.append(&alert);
        self.alerts_emitted += 1;

        Some(alert)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.lifecycle.state(),
            buffered_samples: self.lifecycle.buffered_samples(),
            tracked_sources: self.windows.tracked_sources(),
            events_processed: self.events_processed,
            events_skipped: self.events_skipped,
            alerts_emitted: self.alerts_emitted,
            sink: self.sink.stats(),
            feature_layout: LayoutInfo::current(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::TrainingConfig;
    use crate::logic::model::ForestConfig;
    use std::time::Instant;

    fn test_config(dir: &tempfile::TempDir, anomaly_threshold: f64) -> EngineConfig {
        EngineConfig {
            anomaly_score_threshold: anomaly_threshold,
            training: TrainingConfig {
                interval_secs: 0,
                min_samples: 2,
                forest: ForestConfig::default(),
            },
            alert_log_path: dir.path().join("alerts.csv"),
            ..EngineConfig::default()
        }
    }

    fn build_engine(config: &EngineConfig) -> (Engine, Arc<ModelLifecycle>) {
        let lifecycle = Arc::new(ModelLifecycle::new(config.training.clone()));
        let sink = AlertSink::new(config.alert_log_path.clone());
        (Engine::new(config, lifecycle.clone(), sink), lifecycle)
    }

    fn event(ts: f64, src: &str, port: u16, length: u64, is_syn: bool) -> FlowEvent {
        FlowEvent {
            timestamp: ts,
            source_address: src.to_string(),
            destination_port: port,
            length,
            is_syn,
        }
    }

    /// Mixed benign traffic with enough spread to train on
    fn feed_baseline(engine: &mut Engine) {
        for i in 0..30u16 {
            let src = format!("192.168.1.{}", 10 + i % 3);
            engine.process_event(&event(
                i as f64 * 0.5,
                &src,
                [80u16, 443, 8080][i as usize % 3],
                200 + (i as u64 % 5) * 50,
                i % 4 == 0,
            ));
        }
    }

    #[test]
    fn test_no_alerts_while_collecting() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, -0.2);
        let (mut engine, lifecycle) = build_engine(&config);

        // Blatant port scan during the collection phase: still silent
        for port in 0..40u16 {
            let alert = engine.process_event(&event(
                1.0 + port as f64 * 0.01,
                "10.9.9.9",
                1000 + port,
                60,
                true,
            ));
            assert!(alert.is_none());
        }

        assert_eq!(lifecycle.state(), LifecycleState::Collecting);
        assert_eq!(lifecycle.buffered_samples(), 40);
        assert_eq!(engine.status().alerts_emitted, 0);
    }

    #[test]
    fn test_port_scan_alerts_once_active() {
        let dir = tempfile::tempdir().unwrap();
        // Model threshold pushed out of the way: rules drive this test
        let config = test_config(&dir, -10.0);
        let (mut engine, lifecycle) = build_engine(&config);

        feed_baseline(&mut engine);
        assert!(matches!(
            lifecycle.attempt_transition(Instant::now()),
            crate::logic::model::TransitionOutcome::Published { .. }
        ));

        // 16 distinct ports from one source within one second
        let mut alerts = Vec::new();
        for i in 0..16u16 {
            let alert = engine.process_event(&event(
                100.0 + i as f64 * 0.05,
                "10.0.0.7",
                2000 + i,
                60,
                false,
            ));
            alerts.push(alert);
        }

        // Silent until the 15th distinct port, one alert per event after
        assert!(alerts[..14].iter().all(|a| a.is_none()));
        let fifteenth = alerts[14].as_ref().expect("15th port must alert");
        assert_eq!(fifteenth.reasons, vec!["port_scan_distinct_ports=15"]);
        let sixteenth = alerts[15].as_ref().expect("16th port must alert");
        assert_eq!(sixteenth.reasons, vec!["port_scan_distinct_ports=16"]);
        assert_eq!(engine.status().alerts_emitted, 2);
    }

    #[test]
    fn test_syn_burst_alerts_once_active() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, -10.0);
        let (mut engine, lifecycle) = build_engine(&config);

        feed_baseline(&mut engine);
        lifecycle.attempt_transition(Instant::now());

        // Single port, so only the SYN rule can fire
        let mut alerts = Vec::new();
        for i in 0..31 {
            let alert = engine.process_event(&event(
                200.0 + i as f64 * 0.1,
                "10.0.0.8",
                443,
                60,
                true,
            ));
            alerts.push(alert);
        }

        assert!(alerts[..29].iter().all(|a| a.is_none()));
        assert_eq!(
            alerts[29].as_ref().unwrap().reasons,
            vec!["high_syns=30"]
        );
        assert_eq!(
            alerts[30].as_ref().unwrap().reasons,
            vec!["high_syns=31"]
        );
    }

    #[test]
    fn test_model_only_alert_uses_anomaly_model_reason() {
        let dir = tempfile::tempdir().unwrap();
        // Threshold above the decision range: the model flags everything
        let config = test_config(&dir, 1.0);
        let (mut engine, lifecycle) = build_engine(&config);

        feed_baseline(&mut engine);
        lifecycle.attempt_transition(Instant::now());

        let alert = engine
            .process_event(&event(300.0, "192.168.1.10", 80, 200, false))
            .expect("model threshold of 1.0 flags every window");
        assert!(alert.reasons.is_empty());
        assert_eq!(alert.reason(), "anomaly_model");
    }

    #[test]
    fn test_both_rules_fire_joined_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, -10.0);
        let (mut engine, lifecycle) = build_engine(&config);

        feed_baseline(&mut engine);
        lifecycle.attempt_transition(Instant::now());

        // 35 SYN events across 20 distinct ports
        let mut last = None;
        for i in 0..35u16 {
            last = engine.process_event(&event(
                400.0 + i as f64 * 0.05,
                "10.0.0.9",
                3000 + i % 20,
                60,
                true,
            ));
        }

        let alert = last.expect("both thresholds exceeded");
        assert_eq!(alert.reasons.len(), 2);
        assert!(alert.reasons[0].starts_with("port_scan_distinct_ports="));
        assert_eq!(alert.reasons[1], "high_syns=35");
        assert_eq!(
            alert.reason(),
            format!("{};{}", alert.reasons[0], alert.reasons[1])
        );
    }

    #[test]
    fn test_invalid_event_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, -0.2);
        let (mut engine, _) = build_engine(&config);

        let bad = FlowEvent {
            timestamp: f64::NAN,
            source_address: "10.0.0.1".to_string(),
            destination_port: 80,
            length: 10,
            is_syn: false,
        };
        assert!(engine.process_event(&bad).is_none());

        let status = engine.status();
        assert_eq!(status.events_skipped, 1);
        assert_eq!(status.events_processed, 0);
    }

    #[test]
    fn test_alerts_reach_the_csv_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir, -10.0);
        let (mut engine, lifecycle) = build_engine(&config);

        feed_baseline(&mut engine);
        lifecycle.attempt_transition(Instant::now());

        for i in 0..16u16 {
            engine.process_event(&event(
                500.0 + i as f64 * 0.05,
                "10.0.0.7",
                4000 + i,
                60,
                false,
            ));
        }

        let content = std::fs::read_to_string(&config.alert_log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,src_ip,anomaly_score,reason");
        assert_eq!(lines.len(), 3); // header + alerts for ports 15 and 16
        assert!(lines[1].contains("10.0.0.7"));
        assert!(lines[1].ends_with("port_scan_distinct_ports=15"));
        assert!(lines[2].ends_with("port_scan_distinct_ports=16"));
    }
}
