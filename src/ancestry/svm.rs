use std::fmt;

use linfa::prelude::*;
use linfa_svm::Svm;
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::ancestry::probability::{Sigmoid, clamp_probability, couple};
use crate::config::SvcParams;
use crate::error::{CustomError, Result};

const CV_FOLDS: usize = 5;

/// Multi-class C-SVC with an RBF kernel, trained one-vs-one, with Platt
/// calibrated probabilities.
#[derive(Debug)]
pub struct ClassificationStage {
    n_classes: usize,
    machines: Vec<BinaryMachine>,
}

struct BinaryMachine {
    positive: usize,
    negative: usize,
    svm: Svm<f64, bool>,
    sigmoid: Sigmoid,
}

impl fmt::Debug for BinaryMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryMachine")
            .field("positive", &self.positive)
            .field("negative", &self.negative)
            .field("rho", &self.svm.rho)
            .field("sigmoid", &self.sigmoid)
            .finish_non_exhaustive()
    }
}

impl ClassificationStage {
    /// `classes[i]` is the class index of row `i`, in `0..n_classes`. Every
    /// class must have at least one row.
    pub fn fit(
        x: ArrayView2<f64>,
        classes: &[usize],
        n_classes: usize,
        params: &SvcParams,
        seed: u64,
    ) -> Result<Self> {
        let gamma = params.gamma.resolve(x.ncols());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut machines = Vec::with_capacity(n_classes * n_classes.saturating_sub(1) / 2);
        for positive in 0..n_classes {
            for negative in (positive + 1)..n_classes {
                let rows: Vec<usize> = (0..classes.len())
                    .filter(|&r| classes[r] == positive || classes[r] == negative)
                    .collect();
                let records = x.select(Axis(0), &rows);
                let targets: Array1<bool> = rows.iter().map(|&r| classes[r] == positive).collect();

                let svm = train(&records, &targets, gamma, params)?;
                let decisions = calibration_decisions(&svm, &records, &targets, gamma, params, &mut rng)?;
                let sigmoid = Sigmoid::fit(&decisions, &targets.to_vec());

                debug!(
                    "SVM {positive} vs {negative}: rho={:.6}, sigmoid=({:.4}, {:.4})",
                    svm.rho, sigmoid.a, sigmoid.b
                );
                machines.push(BinaryMachine {
                    positive,
                    negative,
                    svm,
                    sigmoid,
                });
            }
        }

        Ok(Self {
            n_classes,
            machines,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// One decision value per class pair, ordered (0,1), (0,2), ..., (1,2), ...
    /// Positive values favour the lower class index.
    pub fn decision_function(&self, x: ArrayView1<f64>) -> Vec<f64> {
        self.machines.iter().map(|m| decision(&m.svm, x)).collect()
    }

    pub fn predict(&self, x: ArrayView1<f64>) -> usize {
        let decisions = self.decision_function(x);
        vote(
            self.n_classes,
            self.machines
                .iter()
                .zip(decisions)
                .map(|(m, d)| (m.positive, m.negative, d)),
        )
    }

    pub fn predict_proba(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut r = Array2::<f64>::zeros((self.n_classes, self.n_classes));
        for (m, d) in self.machines.iter().zip(self.decision_function(x)) {
            let p = clamp_probability(m.sigmoid.predict(d));
            r[[m.positive, m.negative]] = p;
            r[[m.negative, m.positive]] = 1.0 - p;
        }
        couple(&r)
    }
}

/// Class with the most one-vs-one votes. A decision value of exactly zero
/// votes for the higher class index of the pair; equal vote counts go to the
/// lower index.
fn vote(n_classes: usize, decisions: impl IntoIterator<Item = (usize, usize, f64)>) -> usize {
    let mut votes = vec![0usize; n_classes];
    for (positive, negative, d) in decisions {
        if d > 0.0 {
            votes[positive] += 1;
        } else {
            votes[negative] += 1;
        }
    }
    let mut best = 0;
    for (class, &v) in votes.iter().enumerate() {
        if v > votes[best] {
            best = class;
        }
    }
    best
}

/// C-SVC on one class pair; `true` targets are the positive class.
fn train(
    records: &Array2<f64>,
    targets: &Array1<bool>,
    gamma: f64,
    params: &SvcParams,
) -> Result<Svm<f64, bool>> {
    let dataset = Dataset::new(records.clone(), targets.clone());
    Svm::<f64, bool>::params()
        .gaussian_kernel(1.0 / gamma)
        .pos_neg_weights(params.c, params.c)
        .eps(params.tolerance)
        .fit(&dataset)
        .map_err(|e| CustomError::SvmFit { source: e })
}

fn decision(svm: &Svm<f64, bool>, x: ArrayView1<f64>) -> f64 {
    svm.weighted_sum(&x) - svm.rho
}

/// Decision values used to fit the Platt sigmoid: cross-validated when both
/// classes have at least `CV_FOLDS` rows, in-sample otherwise.
fn calibration_decisions(
    svm: &Svm<f64, bool>,
    records: &Array2<f64>,
    targets: &Array1<bool>,
    gamma: f64,
    params: &SvcParams,
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let n_pos = targets.iter().filter(|&&t| t).count();
    let n_neg = targets.len() - n_pos;
    if n_pos < CV_FOLDS || n_neg < CV_FOLDS {
        trace!("In-sample Platt calibration ({n_pos} vs {n_neg} rows)");
        return Ok(records.rows().into_iter().map(|row| decision(svm, row)).collect());
    }

    let l = targets.len();
    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(rng);
    let mut decisions = vec![0.0; l];
    for fold in 0..CV_FOLDS {
        let (begin, end) = (fold * l / CV_FOLDS, (fold + 1) * l / CV_FOLDS);
        let train_idx: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();
        let train_targets: Array1<bool> = train_idx.iter().map(|&t| targets[t]).collect();
        let has_pos = train_targets.iter().any(|&t| t);
        let has_neg = train_targets.iter().any(|&t| !t);

        let fold_svm = if has_pos && has_neg {
            Some(train(&records.select(Axis(0), &train_idx), &train_targets, gamma, params)?)
        } else {
            None
        };
        for &t in &perm[begin..end] {
            decisions[t] = match &fold_svm {
                Some(s) => decision(s, records.row(t)),
                None if has_pos => 1.0,
                None if has_neg => -1.0,
                None => 0.0,
            };
        }
    }
    Ok(decisions)
}
