//! Anomaly Forest - Unsupervised Isolation Model
//!
//! Implements the pluggable model contract: fit on buffered feature vectors,
//! score live vectors with a decision function where more negative means
//! more anomalous. Points that isolate in few random splits sit far from the
//! trained mass and score below zero; typical traffic scores near or above.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::logic::features::layout::LayoutMismatchError;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

// ============================================================================
// CONSTANTS
// ============================================================================

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// CONFIG
// ============================================================================

/// Forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of isolation trees
    pub tree_count: usize,

    /// Per-tree subsample ceiling
    pub max_samples: usize,

    /// RNG seed; a fixed seed keeps training reproducible
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            tree_count: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Training failure on a pathological buffer
#[derive(Debug)]
pub enum TrainError {
    /// Fewer than two samples, nothing to split
    TooFewSamples { got: usize },
    /// Every feature dimension is constant across the buffer
    DegenerateSamples,
}

impl std::fmt::Display for TrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::TooFewSamples { got } => {
                write!(f, "TrainError: too few samples ({})", got)
            }
            TrainError::DegenerateSamples => {
                write!(f, "TrainError: degenerate samples (all feature values identical)")
            }
        }
    }
}

impl std::error::Error for TrainError {}

// ============================================================================
// TREE STRUCTURE
// ============================================================================

#[derive(Debug)]
enum Node {
    Split {
        dim: usize,
        value: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug)]
struct Tree {
    // Arena layout, root at index 0
    nodes: Vec<Node>,
}

/// Expected path length of an unsuccessful BST search over n points
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

fn build_node(
    samples: &[FeatureVector],
    idx: &mut [usize],
    depth: usize,
    height_limit: usize,
    nodes: &mut Vec<Node>,
    rng: &mut StdRng,
) -> usize {
    if depth >= height_limit || idx.len() <= 1 {
        nodes.push(Node::Leaf { size: idx.len() });
        return nodes.len() - 1;
    }

    // Only dimensions with spread are splittable
    let mut splittable: Vec<(usize, f64, f64)> = Vec::with_capacity(FEATURE_COUNT);
    for dim in 0..FEATURE_COUNT {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &i in idx.iter() {
            let v = samples[i].values[dim];
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if max > min {
            splittable.push((dim, min, max));
        }
    }

    if splittable.is_empty() {
        nodes.push(Node::Leaf { size: idx.len() });
        return nodes.len() - 1;
    }

    let (dim, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let value = rng.gen_range(min..max);

    // Partition in place: left half strictly below the split value
    let mut split_point = 0;
    for i in 0..idx.len() {
        if samples[idx[i]].values[dim] < value {
            idx.swap(i, split_point);
            split_point += 1;
        }
    }

    // Reserve this node's slot before recursing
    nodes.push(Node::Leaf { size: 0 });
    let node_index = nodes.len() - 1;

    let (left_half, right_half) = idx.split_at_mut(split_point);
    let left = build_node(samples, left_half, depth + 1, height_limit, nodes, rng);
    let right = build_node(samples, right_half, depth + 1, height_limit, nodes, rng);

    nodes[node_index] = Node::Split {
        dim,
        value,
        left,
        right,
    };
    node_index
}

// ============================================================================
// ISOLATION FOREST
// ============================================================================

/// Trained isolation forest, published as an immutable shared reference
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Tree>,
    normalizer: f64,
    layout_version: u8,
    layout_hash: u32,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
}

impl IsolationForest {
    /// Fit a forest on the buffered feature vectors.
    /// Fails gracefully on a pathological buffer; the caller keeps collecting.
    pub fn fit(samples: &[FeatureVector], config: &ForestConfig) -> Result<Self, TrainError> {
        if samples.len() < 2 {
            return Err(TrainError::TooFewSamples { got: samples.len() });
        }

        let degenerate = (0..FEATURE_COUNT).all(|dim| {
            let first = samples[0].values[dim];
            samples.iter().all(|s| s.values[dim] == first)
        });
        if degenerate {
            return Err(TrainError::DegenerateSamples);
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = config.max_samples.min(samples.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(config.tree_count);
        for _ in 0..config.tree_count {
            // Subsample without replacement (partial Fisher-Yates)
            let mut indices: Vec<usize> = (0..samples.len()).collect();
            for i in 0..sample_size {
                let j = rng.gen_range(i..indices.len());
                indices.swap(i, j);
            }
            indices.truncate(sample_size);

            let mut nodes = Vec::new();
            build_node(samples, &mut indices, 0, height_limit, &mut nodes, &mut rng);
            trees.push(Tree { nodes });
        }

        Ok(Self {
            trees,
            normalizer: average_path_length(sample_size),
            layout_version: samples[0].version,
            layout_hash: samples[0].layout_hash,
            trained_at: Utc::now(),
            training_samples: samples.len(),
        })
    }

    fn path_length(&self, tree: &Tree, values: &[f64; FEATURE_COUNT]) -> f64 {
        let mut node = 0usize;
        let mut depth = 0.0f64;
        loop {
            match tree.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    dim,
                    value,
                    left,
                    right,
                } => {
                    node = if values[dim] < value { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }

    /// Decision function: `0.5 - 2^(-E[h(x)] / c(sample_size))`.
    /// Ranges over (-0.5, 0.5); below zero means shorter-than-expected
    /// isolation paths, i.e. anomalous.
    pub fn decision_function(&self, vector: &FeatureVector) -> Result<f64, LayoutMismatchError> {
        if vector.version != self.layout_version || vector.layout_hash != self.layout_hash {
            return Err(LayoutMismatchError {
                expected_version: self.layout_version,
                expected_hash: self.layout_hash,
                actual_version: vector.version,
                actual_hash: vector.layout_hash,
            });
        }

        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| self.path_length(tree, &vector.values))
            .sum::<f64>()
            / self.trees.len() as f64;

        let anomaly = 2.0f64.powf(-mean_path / self.normalizer);
        Ok(0.5 - anomaly)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Baseline traffic: small windows, a few ports, modest lengths
    fn baseline_samples() -> Vec<FeatureVector> {
        let mut samples = Vec::new();
        for i in 0..40 {
            let jitter = (i % 5) as f64;
            samples.push(FeatureVector::from_values([
                2.0 + jitter * 0.2,
                1.0 + (i % 3) as f64,
                10.0 + jitter,
                300.0 + (i % 7) as f64 * 10.0,
            ]));
        }
        samples
    }

    #[test]
    fn test_outlier_scores_below_inlier() {
        let samples = baseline_samples();
        let forest = IsolationForest::fit(&samples, &ForestConfig::default()).unwrap();

        let inlier = FeatureVector::from_values([2.4, 2.0, 12.0, 320.0]);
        let outlier = FeatureVector::from_values([60.0, 45.0, 300.0, 1400.0]);

        let inlier_score = forest.decision_function(&inlier).unwrap();
        let outlier_score = forest.decision_function(&outlier).unwrap();

        assert!(
            outlier_score < inlier_score,
            "outlier {} vs inlier {}",
            outlier_score,
            inlier_score
        );
        assert!(outlier_score < 0.0, "outlier score: {}", outlier_score);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let samples = baseline_samples();
        let config = ForestConfig::default();
        let a = IsolationForest::fit(&samples, &config).unwrap();
        let b = IsolationForest::fit(&samples, &config).unwrap();

        let probe = FeatureVector::from_values([7.0, 3.0, 25.0, 200.0]);
        assert_eq!(
            a.decision_function(&probe).unwrap(),
            b.decision_function(&probe).unwrap()
        );
    }

    #[test]
    fn test_degenerate_buffer_fails() {
        let samples = vec![FeatureVector::from_values([1.0, 1.0, 1.0, 1.0]); 30];
        let err = IsolationForest::fit(&samples, &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, TrainError::DegenerateSamples));
    }

    #[test]
    fn test_too_few_samples_fails() {
        let samples = vec![FeatureVector::from_values([1.0, 2.0, 3.0, 4.0])];
        let err = IsolationForest::fit(&samples, &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, TrainError::TooFewSamples { got: 1 }));
    }

    #[test]
    fn test_layout_mismatch_fails_scoring_only() {
        let samples = baseline_samples();
        let forest = IsolationForest::fit(&samples, &ForestConfig::default()).unwrap();

        let mut probe = FeatureVector::from_values([2.0, 1.0, 10.0, 300.0]);
        probe.layout_hash ^= 0xdead_beef;
        assert!(forest.decision_function(&probe).is_err());

        // A well-formed vector still scores
        let probe = FeatureVector::from_values([2.0, 1.0, 10.0, 300.0]);
        assert!(forest.decision_function(&probe).is_ok());
    }
}
