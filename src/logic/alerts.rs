//! Alert Sink - Append-Only CSV Alert Log
//!
//! One row per qualifying event, never deduplicated or merged. The header
//! row is written exactly once, only when the backing file starts empty.
//! Every write is mirrored as a single console line and flushed for
//! durability; a failed write is surfaced and retried on the next alert.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fixed column order of the alert log
const CSV_HEADER: &str = "timestamp,src_ip,anomaly_score,reason";

/// Timestamp format used in alert rows
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// ALERT RECORD
// ============================================================================

/// One emitted alert
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_address: String,
    /// Sign-normalized model score (larger = more anomalous)
    pub anomaly_score: f64,
    /// Fired rule tags, in evaluation order; empty means model-only
    pub reasons: Vec<String>,
}

impl Alert {
    pub fn new(source_address: String, anomaly_score: f64, reasons: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source_address,
            anomaly_score,
            reasons,
        }
    }

    /// Rendered reason column: semicolon-joined tags, or the model marker
    pub fn reason(&self) -> String {
        if self.reasons.is_empty() {
            "anomaly_model".to_string()
        } else {
            self.reasons.join(";")
        }
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{:.4},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_address,
            self.anomaly_score,
            self.reason()
        )
    }

    fn to_console_line(&self) -> String {
        format!(
            "[ALERT] {} | {} | score={:.4} | reason={}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_address,
            self.anomaly_score,
            self.reason()
        )
    }
}

// ============================================================================
// SINK STATS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SinkStats {
    pub alerts_written: u64,
    pub write_failures: u64,
    pub last_error: Option<String>,
}

// ============================================================================
// ALERT SINK
// ============================================================================

/// Durable append-only alert log
pub struct AlertSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    alerts_written: u64,
    write_failures: u64,
    last_error: Option<String>,
}

impl AlertSink {
    /// No I/O happens until the first alert
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            writer: None,
            alerts_written: 0,
            write_failures: 0,
            last_error: None,
        }
    }

    /// Append one alert. The console mirror fires even when the file write
    /// fails; a failure drops the handle so the next alert retries the open.
    pub fn append(&mut self, alert: &Alert) -> io::Result<()> {
        log::warn!("{}", alert.to_console_line());

        match self.write_row(alert) {
            Ok(()) => {
                self.alerts_written += 1;
                Ok(())
            }
            Err(e) => {
                self.write_failures += 1;
                self.last_error = Some(e.to_string());
                self.writer = None;
                log::error!("Alert log write failed ({:?}): {}", self.path, e);
                Err(e)
            }
        }
    }

    fn write_row(&mut self, alert: &Alert) -> io::Result<()> {
        if self.writer.is_none() {
            self.writer = Some(self.open()?);
        }

        // Unwrap is safe: just opened above
        let writer = self.writer.as_mut().unwrap();
        writeln!(writer, "{}", alert.to_csv_row())?;
        writer.flush()?;
        Ok(())
    }

    /// Open for append, writing the header only when the file starts empty
    fn open(&self) -> io::Result<BufWriter<File>> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        if needs_header {
            writeln!(writer, "{}", CSV_HEADER)?;
            writer.flush()?;
            log::info!("Alert log created: {:?}", self.path);
        }

        Ok(writer)
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            alerts_written: self.alerts_written,
            write_failures: self.write_failures,
            last_error: self.last_error.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
