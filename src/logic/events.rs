//! Flow Events - Decoded Input Records
//!
//! One `FlowEvent` per decoded network flow, delivered by the external
//! capture collaborator. The engine never parses packets itself; it only
//! consumes these fields.

use serde::{Deserialize, Serialize};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Decoded flow event, one per packet-level observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    /// Arrival time, monotonic seconds
    pub timestamp: f64,

    /// Source endpoint the event is grouped and windowed by
    pub source_address: String,

    /// Destination port touched by this flow
    pub destination_port: u16,

    /// Payload length in bytes
    pub length: u64,

    /// Connection-initiation marker (TCP SYN)
    pub is_syn: bool,
}

impl FlowEvent {
    /// Parse one NDJSON line from the capture collaborator
    pub fn from_json_line(line: &str) -> Result<Self, EventError> {
        let event: FlowEvent =
            serde_json::from_str(line).map_err(|e| EventError(format!("bad event: {}", e)))?;
        event.validate()?;
        Ok(event)
    }

    /// Reject events with unusable field values
    pub fn validate(&self) -> Result<(), EventError> {
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(EventError(format!(
                "invalid timestamp: {}",
                self.timestamp
            )));
        }
        if self.source_address.is_empty() {
            return Err(EventError("empty source address".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub struct EventError(pub String);

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventError: {}", self.0)
    }
}

impl std::error::Error for EventError {}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let line = r#"{"timestamp":12.5,"source_address":"10.0.0.7","destination_port":443,"length":512,"is_syn":true}"#;
        let event = FlowEvent::from_json_line(line).unwrap();
        assert_eq!(event.source_address, "10.0.0.7");
        assert_eq!(event.destination_port, 443);
        assert_eq!(event.length, 512);
        assert!(event.is_syn);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        // No destination_port
        let line = r#"{"timestamp":12.5,"source_address":"10.0.0.7","length":512,"is_syn":true}"#;
        assert!(FlowEvent::from_json_line(line).is_err());
    }

    #[test]
    fn test_garbage_line_is_rejected() {
        assert!(FlowEvent::from_json_line("not json at all").is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let event = FlowEvent {
            timestamp: f64::NAN,
            source_address: "10.0.0.7".to_string(),
            destination_port: 80,
            length: 0,
            is_syn: false,
        };
        assert!(event.validate().is_err());

        let event = FlowEvent {
            timestamp: 5.0,
            source_address: String::new(),
            destination_port: 80,
            length: 0,
            is_syn: false,
        };
        assert!(event.validate().is_err());
    }
}
