use log::debug;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{CustomError, Result};

const N_OVERSAMPLES: usize = 10;
// Singular values below this fraction of the largest one are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Principal component projection fitted with a randomized SVD.
///
/// Every projected row has `n_components` coordinates. When the training data
/// has fewer usable components (fewer samples or sites than requested, or
/// rank deficiency) the trailing coordinates are always zero.
#[derive(Debug, Clone)]
pub struct ReductionStage {
    mean: Array1<f64>,
    // (n_kept, n_features)
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    scale: Array1<f64>,
    n_components: usize,
}

impl ReductionStage {
    pub fn fit(x: ArrayView2<f64>, n_components: usize, whiten: bool, seed: u64) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples < 2 {
            return Err(CustomError::SampleCount { n_samples });
        }
        if n_features == 0 {
            return Err(CustomError::NoRetainedSites);
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(CustomError::SampleCount { n_samples })?;
        let centered = &x - &mean;
        let a = DMatrix::from_fn(n_samples, n_features, |i, j| centered[[i, j]]);

        let k = n_components.min(n_samples).min(n_features);
        let rank_bound = n_samples.min(n_features);
        let n_random = (k + N_OVERSAMPLES).min(rank_bound);
        let n_iter = if (k as f64) < 0.1 * rank_bound as f64 { 7 } else { 4 };

        let mut rng = StdRng::seed_from_u64(seed);
        let omega = DMatrix::from_fn(n_features, n_random, |_, _| {
            rng.sample::<f64, _>(StandardNormal)
        });

        // Range finder with power iterations
        let mut q = (&a * omega).qr().q();
        for _ in 0..n_iter {
            q = (a.transpose() * &q).qr().q();
            q = (&a * &q).qr().q();
        }

        let b = q.transpose() * &a;
        let svd = b
            .try_svd(false, true, f64::EPSILON, 0)
            .ok_or(CustomError::Decomposition)?;
        let v_t = svd.v_t.ok_or(CustomError::Decomposition)?;
        let singular = svd.singular_values;

        let mut order: Vec<usize> = (0..singular.len()).collect();
        order.sort_by(|&i, &j| singular[j].total_cmp(&singular[i]));
        let s_max = order.first().map_or(0.0, |&i| singular[i]);
        let kept: Vec<usize> = order
            .into_iter()
            .take(k)
            .filter(|&i| singular[i] > RANK_TOLERANCE * s_max && singular[i] > 0.0)
            .collect();

        let mut components = Array2::zeros((kept.len(), n_features));
        for (row, &i) in kept.iter().enumerate() {
            let v = v_t.row(i);
            // Largest-magnitude loading is made positive
            let pivot = v.iter().copied().fold(0.0f64, |acc, x| {
                if x.abs() > acc.abs() { x } else { acc }
            });
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            for (j, value) in v.iter().enumerate() {
                components[[row, j]] = sign * value;
            }
        }

        let explained_variance: Array1<f64> = kept
            .iter()
            .map(|&i| singular[i] * singular[i] / (n_samples - 1) as f64)
            .collect();
        let scale = if whiten {
            explained_variance.mapv(|v| 1.0 / v.sqrt())
        } else {
            Array1::ones(kept.len())
        };
        debug!(
            "PCA: {} of {} components kept, explained variance {:?}",
            kept.len(),
            n_components,
            explained_variance.to_vec()
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            scale,
            n_components,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    /// Callers check that `x` has `n_features()` columns.
    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let centered = &x - &self.mean;
        let projected = centered.dot(&self.components.t()) * &self.scale;
        let mut out = Array2::zeros((x.nrows(), self.n_components));
        out.slice_mut(ndarray::s![.., ..projected.ncols()])
            .assign(&projected);
        out
    }
}
