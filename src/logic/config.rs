//! Engine Configuration
//!
//! Explicit config objects passed into the engine and trainer.
//! All defaults live in `constants.rs`; every field can be overridden
//! through the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants;
use crate::logic::model::forest::ForestConfig;

/// Training lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Baseline collection time before a training attempt (seconds)
    pub interval_secs: u64,

    /// Minimum buffered feature vectors required to train
    pub min_samples: usize,

    /// Forest hyperparameters
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            interval_secs: constants::DEFAULT_TRAINING_INTERVAL_SECS,
            min_samples: constants::DEFAULT_MIN_TRAINING_SAMPLES,
            forest: ForestConfig::default(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sliding window length per source address (seconds)
    pub window_seconds: f64,

    /// Distinct destination ports within the window that indicate a port scan
    pub port_scan_threshold: u32,

    /// SYN packets within the window that indicate a SYN burst
    pub syn_rate_threshold: u32,

    /// Model decision scores below this are anomalous
    pub anomaly_score_threshold: f64,

    /// Training lifecycle settings
    pub training: TrainingConfig,

    /// Trainer task polling interval (seconds)
    pub trainer_poll_secs: u64,

    /// Source addresses idle longer than this are evicted (seconds)
    pub idle_source_timeout_secs: f64,

    /// Hard cap on buffered window entries per source address
    pub max_entries_per_source: usize,

    /// Alert log path
    pub alert_log_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_seconds: constants::DEFAULT_WINDOW_SECONDS,
            port_scan_threshold: constants::DEFAULT_PORT_SCAN_THRESHOLD,
            syn_rate_threshold: constants::DEFAULT_SYN_RATE_THRESHOLD,
            anomaly_score_threshold: constants::DEFAULT_ANOMALY_SCORE_THRESHOLD,
            training: TrainingConfig::default(),
            trainer_poll_secs: constants::DEFAULT_TRAINER_POLL_SECS,
            idle_source_timeout_secs: constants::DEFAULT_IDLE_SOURCE_TIMEOUT_SECS,
            max_entries_per_source: constants::DEFAULT_MAX_ENTRIES_PER_SOURCE,
            alert_log_path: PathBuf::from(constants::DEFAULT_ALERT_LOG_PATH),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            window_seconds: constants::get_window_seconds(),
            port_scan_threshold: constants::get_port_scan_threshold(),
            syn_rate_threshold: constants::get_syn_rate_threshold(),
            anomaly_score_threshold: constants::get_anomaly_score_threshold(),
            training: TrainingConfig {
                interval_secs: constants::get_training_interval_secs(),
                min_samples: constants::get_min_training_samples(),
                forest: ForestConfig::default(),
            },
            trainer_poll_secs: constants::get_trainer_poll_secs(),
            idle_source_timeout_secs: constants::get_idle_source_timeout_secs(),
            max_entries_per_source: constants::get_max_entries_per_source(),
            alert_log_path: PathBuf::from(constants::get_alert_log_path()),
        }
    }
}
