//! Model Module - Anomaly Model & Training Lifecycle
//!
//! `forest` implements the pluggable fit/score contract; `lifecycle` owns
//! the collect → train → active state machine shared with the trainer task.

pub mod forest;
pub mod lifecycle;

// Re-export common types
pub use forest::{ForestConfig, IsolationForest, TrainError};
pub use lifecycle::{LifecycleState, ModelLifecycle, Observation, TransitionOutcome};
