//! Rule Evaluator - Fixed Threshold Detections
//!
//! Stateless checks against a window's feature vector. Tag order is fixed:
//! port scan first, SYN burst second. The engine only consults rules once
//! the model lifecycle is active.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::features::FeatureVector;

// ============================================================================
// CONFIG
// ============================================================================

/// Threshold configuration for the rule checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Distinct destination ports within the window that indicate a port scan
    pub port_scan_threshold: u32,

    /// SYN packets within the window that indicate a SYN burst
    pub syn_rate_threshold: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            port_scan_threshold: constants::DEFAULT_PORT_SCAN_THRESHOLD,
            syn_rate_threshold: constants::DEFAULT_SYN_RATE_THRESHOLD,
        }
    }
}

// ============================================================================
// RULE EVALUATOR
// ============================================================================

/// Stateless threshold checks
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Evaluate both checks; returns the fired reason tags in output order.
    pub fn evaluate(&self, features: &FeatureVector) -> Vec<String> {
        let mut reasons = Vec::new();

        let distinct_ports = features.values[0] as u32;
        let syn_count = features.values[1] as u32;

        if distinct_ports >= self.config.port_scan_threshold {
            reasons.push(format!("port_scan_distinct_ports={}", distinct_ports));
        }
        if syn_count >= self.config.syn_rate_threshold {
            reasons.push(format!("high_syns={}", syn_count));
        }

        reasons
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
