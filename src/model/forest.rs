//! Bagged binary decision trees (Gini, grown to purity) with averaged leaf probabilities.

use super::AnomalySignal;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        /// Fraction of positive samples that reached this leaf
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    labels: &'a [bool],
    max_features: usize,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn grow(&mut self, rows: Vec<usize>, rng: &mut StdRng) -> usize {
        let id = self.nodes.len();
        let positives = rows.iter().filter(|&&r| self.labels[r]).count();
        let positive = if rows.is_empty() {
            0.0
        } else {
            positives as f64 / rows.len() as f64
        };
        self.nodes.push(TreeNode::Leaf { positive });
        if rows.len() < 2 || positives == 0 || positives == rows.len() {
            return id;
        }

        let Some((feature, threshold)) = self.best_split(&rows, rng) else {
            return id;
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| self.x[[r, feature]] < threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return id;
        }
        let left = self.grow(left_rows, rng);
        let right = self.grow(right_rows, rng);
        self.nodes[id] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Lowest weighted Gini split over `max_features` non-constant features, visited in random order.
    fn best_split(&self, rows: &[usize], rng: &mut StdRng) -> Option<(usize, f64)> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<(f64, usize, f64)> = None;
        let mut visited = 0;
        for f in features {
            if visited >= self.max_features {
                break;
            }
            let mut column: Vec<(f64, bool)> = rows.iter().map(|&r| (self.x[[r, f]], self.labels[r])).collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column.first().map(|c| c.0) == column.last().map(|c| c.0) {
                continue;
            }
            visited += 1;

            let total = column.len() as f64;
            let total_pos = column.iter().filter(|c| c.1).count() as f64;
            let mut left_pos = 0.0;
            for i in 1..column.len() {
                if column[i - 1].1 {
                    left_pos += 1.0;
                }
                if column[i].0 <= column[i - 1].0 {
                    continue;
                }
                let n_left = i as f64;
                let n_right = total - n_left;
                let impurity =
                    n_left * gini(left_pos, n_left) + n_right * gini(total_pos - left_pos, n_right);
                if best.map_or(true, |(b, _, _)| impurity < b) {
                    best = Some((impurity, f, (column[i - 1].0 + column[i].0) / 2.0));
                }
            }
        }
        best.map(|(_, f, t)| (f, t))
    }
}

fn gini(positives: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let p = positives / n;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                TreeNode::Leaf { positive } => return *positive,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    max_features: usize,
    /// Fraction of positive labels seen at fit time
    positive_rate: f64,
}

impl RandomForestClassifier {
    /// Fit on bootstrap resamples; `labels` must be index-aligned with the rows of `x`.
    pub fn fit(x: ArrayView2<'_, f64>, labels: &[bool], n_estimators: usize, seed: u64) -> Self {
        let n = x.nrows().min(labels.len());
        let max_features = ((x.ncols() as f64).sqrt().floor() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..n_estimators)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n.max(1))).collect();
                let mut builder = TreeBuilder {
                    x: x.view(),
                    labels,
                    max_features,
                    nodes: Vec::new(),
                };
                builder.grow(bootstrap, &mut rng);
                DecisionTree { nodes: builder.nodes }
            })
            .collect();

        let positive_rate = if n == 0 {
            0.0
        } else {
            labels[..n].iter().filter(|&&l| l).count() as f64 / n as f64
        };

        Self {
            trees,
            max_features,
            positive_rate,
        }
    }

    /// Probability of the positive (anomalous) class per row, in [0, 1].
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let n_trees = self.trees.len().max(1) as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let p = self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / n_trees;
                p.clamp(0.0, 1.0)
            })
            .collect()
    }

    pub fn positive_rate(&self) -> f64 {
        self.positive_rate
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl AnomalySignal for RandomForestClassifier {
    fn anomaly_signal(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.predict_proba(x)
    }
}
