//! Confusion counts, precision / recall / F1 and rank-based ROC-AUC.

use crate::error::{DetectError, Result};
use crate::risk::Prediction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tn: usize,
}

impl ConfusionMatrix {
    pub fn from_decisions(labels: &[bool], decisions: &[u8]) -> Self {
        let mut m = ConfusionMatrix::default();
        for (&truth, &d) in labels.iter().zip(decisions) {
            match (truth, d == 1) {
                (true, true) => m.tp += 1,
                (false, true) => m.fp += 1,
                (true, false) => m.fn_ += 1,
                (false, false) => m.tn += 1,
            }
        }
        m
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub samples: usize,
    pub true_anomalies: usize,
    pub detected_anomalies: usize,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the labels contain a single class
    pub auc: Option<f64>,
}

/// Compare a prediction with index-aligned ground truth.
pub fn evaluate(labels: &[bool], prediction: &Prediction) -> Result<EvaluationReport> {
    if labels.len() != prediction.len() {
        return Err(DetectError::validation(format!(
            "{} labels for {} predictions",
            labels.len(),
            prediction.len()
        )));
    }
    let confusion = ConfusionMatrix::from_decisions(labels, &prediction.is_anomaly);
    Ok(EvaluationReport {
        samples: labels.len(),
        true_anomalies: labels.iter().filter(|&&l| l).count(),
        detected_anomalies: prediction.flagged(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        auc: roc_auc(labels, &prediction.ensemble_score),
        confusion,
    })
}

/// Mann–Whitney estimate of ROC-AUC; tied scores share their average rank.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let positives = labels[..n].iter().filter(|&&l| l).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let rank_sum: f64 = (0..n).filter(|&k| labels[k]).map(|k| ranks[k]).sum();
    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}
