//! Model Lifecycle - Collect, Train, Activate
//!
//! The state machine shared between the ingestion path and the trainer task.
//! `{state, model, buffer, timer}` live behind one mutex so collect-vs-score
//! is a single linearizable decision: no event is ever scored against a
//! half-published model and no sample straddles the collect→active boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::config::TrainingConfig;
use crate::logic::features::FeatureVector;
use crate::logic::model::forest::{IsolationForest, TrainError};

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Lifecycle phase. Collecting at process start; the Active transition is
/// one-shot for the remaining process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Collecting,
    Active,
}

/// What the ingestion path learned from one `observe` call
pub enum Observation {
    /// Still collecting; the vector was appended to the training buffer
    Collecting { buffered: usize },
    /// Model is live; score against it
    Active(Arc<IsolationForest>),
}

/// Outcome of one trainer poll
pub enum TransitionOutcome {
    /// Collection interval has not elapsed yet
    NotDue,
    /// Model already published; nothing left to do
    AlreadyActive,
    /// Interval elapsed but too few samples; timer reset, buffer retained
    InsufficientSamples { buffered: usize, required: usize },
    /// Fit failed on a pathological buffer; timer reset, buffer retained
    TrainFailed(TrainError),
    /// Model fitted and published; buffer cleared, state now Active
    Published { samples: usize },
}

// ============================================================================
// GUARDED UNIT
// ============================================================================

struct LifecycleInner {
    state: LifecycleState,
    model: Option<Arc<IsolationForest>>,
    buffer: Vec<FeatureVector>,
    timer_start: Instant,
}

/// The shared lifecycle unit. Ingestion calls `observe`; the trainer task
/// calls `attempt_transition`. Nothing else touches the inner state.
pub struct ModelLifecycle {
    inner: Mutex<LifecycleInner>,
    config: TrainingConfig,
}

impl ModelLifecycle {
    /// Timer starts at construction, i.e. process start.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            inner: Mutex::new(LifecycleInner {
                state: LifecycleState::Collecting,
                model: None,
                buffer: Vec::new(),
                timer_start: Instant::now(),
            }),
            config,
        }
    }

    /// Collect-or-score decision for one freshly extracted vector.
    pub fn observe(&self, vector: &FeatureVector) -> Observation {
        let mut inner = self.inner.lock();
        match inner.state {
            LifecycleState::Collecting => {
                inner.buffer.push(vector.clone());
                Observation::Collecting {
                    buffered: inner.buffer.len(),
                }
            }
            LifecycleState::Active => {
                // Invariant: Active implies a published model
                let model = inner
                    .model
                    .as_ref()
                    .expect("active lifecycle without model")
                    .clone();
                Observation::Active(model)
            }
        }
    }

    /// One trainer poll. The fit runs inside the guarded section so the
    /// publish is atomic with the buffer clear; cost stays bounded by the
    /// forest's per-tree subsample ceiling.
    pub fn attempt_transition(&self, now: Instant) -> TransitionOutcome {
        let mut inner = self.inner.lock();

        if inner.state == LifecycleState::Active {
            return TransitionOutcome::AlreadyActive;
        }

        let interval = Duration::from_secs(self.config.interval_secs);
        if now.duration_since(inner.timer_start) < interval {
            return TransitionOutcome::NotDue;
        }

        if inner.buffer.len() < self.config.min_samples {
            inner.timer_start = now;
            return TransitionOutcome::InsufficientSamples {
                buffered: inner.buffer.len(),
                required: self.config.min_samples,
            };
        }

        match IsolationForest::fit(&inner.buffer, &self.config.forest) {
            Ok(forest) => {
                let samples = inner.buffer.len();
                inner.model = Some(Arc::new(forest));
                inner.buffer.clear();
                inner.state = LifecycleState::Active;
                TransitionOutcome::Published { samples }
            }
            Err(e) => {
                inner.timer_start = now;
                TransitionOutcome::TrainFailed(e)
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    pub fn current_model(&self) -> Option<Arc<IsolationForest>> {
        self.inner.lock().model.clone()
    }

    pub fn buffered_samples(&self) -> usize {
        self.inner.lock().buffer.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
