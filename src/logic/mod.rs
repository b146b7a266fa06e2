//! Logic Module - Detection Engines
//!
//! Per-event pipeline: `events` → `window` → `features` → {`rules`,
//! `model` + `scorer`} → `alerts`, wired together by `engine`. The
//! `trainer` task drives the model lifecycle in the background.

pub mod alerts;
pub mod config;
pub mod engine;
pub mod events;
pub mod features;
pub mod model;
pub mod rules;
pub mod scorer;
pub mod trainer;
pub mod window;
