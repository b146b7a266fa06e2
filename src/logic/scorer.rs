//! Anomaly Scorer - Model Score to Alert Decision
//!
//! Wraps the model's decision function and the trigger rule. A scoring
//! failure fails only that event's anomaly score; the caller's rule-based
//! reasons still stand on their own.

use crate::logic::features::FeatureVector;
use crate::logic::model::IsolationForest;

pub struct AnomalyScorer {
    /// Decision scores below this are anomalous
    threshold: f64,
}

impl AnomalyScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Score one vector against the live model. `None` when the model
    /// rejected the vector (layout mismatch); rule evaluation is unaffected.
    pub fn score(&self, model: &IsolationForest, features: &FeatureVector) -> Option<f64> {
        match model.decision_function(features) {
            Ok(score) => Some(score),
            Err(e) => {
                log::debug!("Anomaly score unavailable for this event: {}", e);
                None
            }
        }
    }

    /// Trigger rule: model flags the window, or any threshold rule fired.
    pub fn should_alert(&self, score: Option<f64>, reasons: &[String]) -> bool {
        score.map(|s| s < self.threshold).unwrap_or(false) || !reasons.is_empty()
    }

    /// Sign-normalized magnitude for the alert log (larger = more anomalous).
    /// Zero when the score itself was unavailable and only rules fired.
    pub fn reported_magnitude(score: Option<f64>) -> f64 {
        score.map(|s| -s).unwrap_or(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
