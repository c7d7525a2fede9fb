//! Local outlier factor in novelty mode: fit on a reference set, score any batch against it.

use super::{percentile, AnomalySignal};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::warn;

const DENSITY_EPS: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct LocalOutlierFactor {
    reference: Array2<f64>,
    k: usize,
    /// Distance from each reference point to its k-th neighbor
    k_distance: Vec<f64>,
    /// Local reachability density of each reference point
    lrd: Vec<f64>,
    /// `contamination` percentile of the training negative outlier factors
    offset: f64,
    training_factors: Vec<f64>,
}

impl LocalOutlierFactor {
    /// Fit on at least two rows; `n_neighbors` is capped at `rows - 1`.
    pub fn fit(x: ArrayView2<'_, f64>, n_neighbors: usize, contamination: f64) -> Self {
        let n = x.nrows();
        let k = n_neighbors.min(n.saturating_sub(1)).max(1);
        if k < n_neighbors {
            warn!(n_neighbors, samples = n, k, "n_neighbors exceeds sample count; capped");
        }

        let neighborhoods: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|i| k_nearest(&x, x.row(i), k, Some(i)))
            .collect();
        let k_distance: Vec<f64> = neighborhoods
            .iter()
            .map(|nb| nb.last().map(|&(_, d)| d).unwrap_or(0.0))
            .collect();
        let lrd: Vec<f64> = neighborhoods
            .iter()
            .map(|nb| reachability_density(nb, &k_distance))
            .collect();
        let training_factors: Vec<f64> = neighborhoods
            .iter()
            .zip(&lrd)
            .map(|(nb, &own)| negative_factor(nb, &lrd, own))
            .collect();
        let offset = percentile(&training_factors, 100.0 * contamination);

        Self {
            reference: x.to_owned(),
            k,
            k_distance,
            lrd,
            offset,
            training_factors,
        }
    }

    /// Negative local outlier factor; around -1 for inliers, more negative for outliers.
    pub fn score_samples(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let reference = self.reference.view();
        x.rows()
            .into_iter()
            .map(|row| {
                let nb = k_nearest(&reference, row, self.k, None);
                let own = reachability_density(&nb, &self.k_distance);
                negative_factor(&nb, &self.lrd, own)
            })
            .collect()
    }

    /// Shifted so that negative values are outliers; higher is more normal.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.score_samples(x) - self.offset
    }

    pub fn predict_outliers(&self, x: ArrayView2<'_, f64>) -> Vec<bool> {
        self.decision_function(x).iter().map(|&d| d < 0.0).collect()
    }

    pub fn n_neighbors(&self) -> usize {
        self.k
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn training_factors(&self) -> &[f64] {
        &self.training_factors
    }
}

impl AnomalySignal for LocalOutlierFactor {
    /// Sign-flipped decision function.
    fn anomaly_signal(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        -self.decision_function(x)
    }
}

/// Brute-force k nearest reference rows by Euclidean distance, nearest first.
fn k_nearest(
    reference: &ArrayView2<'_, f64>,
    row: ArrayView1<'_, f64>,
    k: usize,
    skip: Option<usize>,
) -> Vec<(usize, f64)> {
    let mut dists: Vec<(usize, f64)> = reference
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(j, _)| Some(*j) != skip)
        .map(|(j, other)| (j, euclidean(row, other)))
        .collect();
    let k = k.min(dists.len());
    if k == 0 {
        return Vec::new();
    }
    dists.select_nth_unstable_by(k - 1, |a, b| a.1.total_cmp(&b.1));
    dists.truncate(k);
    dists.sort_by(|a, b| a.1.total_cmp(&b.1));
    dists
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn reachability_density(neighbors: &[(usize, f64)], k_distance: &[f64]) -> f64 {
    if neighbors.is_empty() {
        return 1.0 / DENSITY_EPS;
    }
    let mean_reach = neighbors
        .iter()
        .map(|&(o, d)| d.max(k_distance[o]))
        .sum::<f64>()
        / neighbors.len() as f64;
    1.0 / (mean_reach + DENSITY_EPS)
}

fn negative_factor(neighbors: &[(usize, f64)], lrd: &[f64], own: f64) -> f64 {
    if neighbors.is_empty() {
        return -1.0;
    }
    let ratio = neighbors.iter().map(|&(o, _)| lrd[o] / own).sum::<f64>() / neighbors.len() as f64;
    -ratio
}
