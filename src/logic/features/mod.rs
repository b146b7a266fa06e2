//! Features Module - Window Feature Extraction
//!
//! Derives the fixed feature vector from a source's pruned window.
//! Pure computation; the window store is responsible for pruning first.

pub mod layout;
pub mod vector;

use std::collections::HashSet;

use crate::logic::window::WindowEntry;

// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::FeatureVector;

/// Build the feature vector for one source's current window:
/// `[distinct_ports, syn_count, total_events, avg_length]`.
/// An empty window yields all zeros.
pub fn extract<'a, I>(entries: I) -> FeatureVector
where
    I: IntoIterator<Item = &'a WindowEntry>,
{
    let mut ports: HashSet<u16> = HashSet::new();
    let mut syn_count = 0u64;
    let mut total = 0u64;
    let mut length_sum = 0u64;

    for entry in entries {
        ports.insert(entry.destination_port);
        if entry.is_syn {
            syn_count += 1;
        }
        total += 1;
        length_sum += entry.length;
    }

    let avg_length = if total > 0 {
        length_sum as f64 / total as f64
    } else {
        0.0
    };

    FeatureVector::from_values([ports.len() as f64, syn_count as f64, total as f64, avg_length])
}

// ============================================================================
// TESTS
// ============================================================================
