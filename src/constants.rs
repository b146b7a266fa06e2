//! Central Configuration Constants
//!
//! Single source of truth for all detection defaults.
//! To change a default threshold, only edit this file.

/// Sliding window length per source address (seconds)
pub const DEFAULT_WINDOW_SECONDS: f64 = 10.0;

/// Distinct destination ports within the window that indicate a port scan
pub const DEFAULT_PORT_SCAN_THRESHOLD: u32 = 15;

/// SYN packets within the window that indicate a SYN burst
pub const DEFAULT_SYN_RATE_THRESHOLD: u32 = 30;

/// Baseline collection time before a training attempt (seconds)
pub const DEFAULT_TRAINING_INTERVAL_SECS: u64 = 60;

/// Minimum buffered feature vectors required to train
pub const DEFAULT_MIN_TRAINING_SAMPLES: usize = 20;

/// Model decision scores below this are anomalous
pub const DEFAULT_ANOMALY_SCORE_THRESHOLD: f64 = -0.2;

/// Trainer task polling interval (seconds)
pub const DEFAULT_TRAINER_POLL_SECS: u64 = 2;

/// Source addresses idle longer than this are evicted (seconds)
pub const DEFAULT_IDLE_SOURCE_TIMEOUT_SECS: f64 = 300.0;

/// Hard cap on buffered window entries per source address
pub const DEFAULT_MAX_ENTRIES_PER_SOURCE: usize = 10_000;

/// Default alert log path
pub const DEFAULT_ALERT_LOG_PATH: &str = "ids_alerts.csv";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Net-IDS Core";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get window length from environment or use default
pub fn get_window_seconds() -> f64 {
    std::env::var("IDS_WINDOW_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_WINDOW_SECONDS)
}

/// Get port scan threshold from environment or use default
pub fn get_port_scan_threshold() -> u32 {
    std::env::var("IDS_PORT_SCAN_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT_SCAN_THRESHOLD)
}

/// Get SYN rate threshold from environment or use default
pub fn get_syn_rate_threshold() -> u32 {
    std::env::var("IDS_SYN_RATE_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SYN_RATE_THRESHOLD)
}

/// Get training interval from environment or use default
pub fn get_training_interval_secs() -> u64 {
    std::env::var("IDS_TRAINING_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TRAINING_INTERVAL_SECS)
}

/// Get minimum training sample count from environment or use default
pub fn get_min_training_samples() -> usize {
    std::env::var("IDS_MIN_TRAINING_SAMPLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MIN_TRAINING_SAMPLES)
}

/// Get anomaly score threshold from environment or use default
pub fn get_anomaly_score_threshold() -> f64 {
    std::env::var("IDS_ANOMALY_SCORE_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ANOMALY_SCORE_THRESHOLD)
}

/// Get trainer poll interval from environment or use default
pub fn get_trainer_poll_secs() -> u64 {
    std::env::var("IDS_TRAINER_POLL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TRAINER_POLL_SECS)
}

/// Get idle source timeout from environment or use default
pub fn get_idle_source_timeout_secs() -> f64 {
    std::env::var("IDS_IDLE_SOURCE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_IDLE_SOURCE_TIMEOUT_SECS)
}

/// Get per-source entry cap from environment or use default
pub fn get_max_entries_per_source() -> usize {
    std::env::var("IDS_MAX_ENTRIES_PER_SOURCE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_ENTRIES_PER_SOURCE)
}

/// Get alert log path from environment or use default
pub fn get_alert_log_path() -> String {
    std::env::var("IDS_ALERT_LOG").unwrap_or_else(|_| DEFAULT_ALERT_LOG_PATH.to_string())
}
