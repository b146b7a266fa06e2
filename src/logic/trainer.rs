//! Trainer Task - Background Lifecycle Polling
//!
//! Wakes on a fixed interval and tries to move the lifecycle from
//! collecting to active. Once the model is published the task parks itself;
//! there is no periodic retraining in this design.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::logic::model::{ModelLifecycle, TransitionOutcome};

/// Spawn the trainer loop. Runs until the model is published or the
/// process terminates.
pub fn spawn(lifecycle: Arc<ModelLifecycle>, poll_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!("Trainer task started; collecting baseline traffic");

        loop {
            tokio::time::sleep(poll_interval).await;

            match lifecycle.attempt_transition(Instant::now()) {
                TransitionOutcome::NotDue => {}
                TransitionOutcome::InsufficientSamples { buffered, required } => {
                    log::info!(
                        "Not enough training data ({}/{}), collecting for another interval",
                        buffered,
                        required
                    );
                }
                TransitionOutcome::TrainFailed(e) => {
                    log::warn!("Training failed: {}; keeping buffer for another interval", e);
                }
                TransitionOutcome::Published { samples } => {
                    log::info!("Model trained on {} samples. Detection active.", samples);
                    break;
                }
                TransitionOutcome::AlreadyActive => break,
            }
        }

        log::info!("Trainer task idle (model active)");
    })
}

// ============================================================================
// TESTS
// ============================================================================
