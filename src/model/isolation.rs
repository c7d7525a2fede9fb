//! Isolation forest: anomalies need fewer random partitions to be isolated.

use super::{percentile, AnomalySignal};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum IsoNode {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<IsoNode>,
}

impl IsolationTree {
    fn build(x: &ArrayView2<'_, f64>, sample: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, sample, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &ArrayView2<'_, f64>,
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(IsoNode::Leaf { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return id;
        }

        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(rng);
        let split = features.into_iter().find_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = x[[r, f]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then(|| (f, lo + (hi - lo) * rng.gen::<f64>()))
        });
        let Some((feature, threshold)) = split else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| x[[r, feature]] < threshold);
        let left = self.grow(x, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(x, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = IsoNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[id] {
                IsoNode::Leaf { size } => return depth + average_path_length(*size),
                IsoNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Effective subsample size ψ
    max_samples: usize,
    /// Scores above this are outliers; the (1 - contamination) training percentile
    threshold: f64,
    training_scores: Vec<f64>,
}

impl IsolationForest {
    /// Fit on at least two rows; `max_samples` is capped at the row count.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        n_estimators: usize,
        max_samples: usize,
        contamination: f64,
        seed: u64,
    ) -> Self {
        let n = x.nrows();
        if n == 0 {
            return Self {
                trees: Vec::new(),
                max_samples: 0,
                threshold: f64::INFINITY,
                training_scores: Vec::new(),
            };
        }
        let psi = max_samples.min(n).max(1);
        let height_limit = (psi as f64).log2().ceil().max(0.0) as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..n_estimators)
            .map(|_| {
                let sample = rand::seq::index::sample(&mut rng, n, psi).into_vec();
                IsolationTree::build(&x, sample, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            max_samples: psi,
            threshold: f64::INFINITY,
            training_scores: Vec::new(),
        };
        let scores = forest.score(x).to_vec();
        forest.threshold = percentile(&scores, 100.0 * (1.0 - contamination));
        forest.training_scores = scores;
        forest
    }

    /// Anomaly score `2^(-E[h(x)] / c(ψ))` in (0, 1]; higher is more anomalous.
    pub fn score(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let norm = average_path_length(self.max_samples).max(f64::EPSILON);
        let n_trees = self.trees.len().max(1) as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / n_trees;
                2f64.powf(-mean_depth / norm)
            })
            .collect()
    }

    /// Binary outlier calls against the training-derived threshold.
    pub fn predict_outliers(&self, x: ArrayView2<'_, f64>) -> Vec<bool> {
        self.score(x).iter().map(|&s| s > self.threshold).collect()
    }

    /// Outlier calls for the rows the forest was fitted on.
    pub fn training_outliers(&self) -> Vec<bool> {
        self.training_scores.iter().map(|&s| s > self.threshold).collect()
    }

    pub fn training_scores(&self) -> &[f64] {
        &self.training_scores
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl AnomalySignal for IsolationForest {
    fn anomaly_signal(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.score(x)
    }
}
