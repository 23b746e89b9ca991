//! Whitened PCA followed by a calibrated RBF support-vector classifier,
//! fitted on the background panel and applied to query samples.

pub mod pca;
pub mod probability;
pub mod svm;

use itertools::Itertools;
use log::info;
use ndarray::{Array2, ArrayView2};

use crate::ancestry::pca::ReductionStage;
use crate::ancestry::svm::ClassificationStage;
use crate::cohort::AlignedCohort;
use crate::config::ModelConfig;
use crate::error::{CustomError, Result};

/// State produced by [`AncestryModel::fit`], valid for one run.
#[derive(Debug)]
pub struct FittedModel {
    reduction: ReductionStage,
    classification: ClassificationStage,
    retained_sites: Vec<usize>,
    labels: Vec<String>,
}

impl FittedModel {
    /// Distinct background labels in order of first appearance. This is
    /// the column order of every probability vector.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn retained_sites(&self) -> &[usize] {
        &self.retained_sites
    }

    pub fn reduction(&self) -> &ReductionStage {
        &self.reduction
    }

    pub fn classification(&self) -> &ClassificationStage {
        &self.classification
    }
}

#[derive(Debug, Clone)]
pub struct Predictions {
    /// (n_samples, n_components)
    pub coordinates: Array2<f64>,
    /// Index into the fitted labels, one per sample.
    pub predicted: Vec<usize>,
    /// (n_samples, n_labels)
    pub probabilities: Array2<f64>,
}

#[derive(Debug, Default)]
pub struct AncestryModel {
    config: ModelConfig,
    fitted: Option<FittedModel>,
}

impl AncestryModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn fit(&mut self, cohort: &AlignedCohort) -> Result<&FittedModel> {
        let background = cohort.background();
        if background.len() < 2 {
            return Err(CustomError::SampleCount {
                n_samples: background.len(),
            });
        }
        if cohort.is_empty() {
            return Err(CustomError::NoRetainedSites);
        }

        let sample_labels = background
            .members()
            .iter()
            .map(|m| {
                m.label.as_deref().ok_or_else(|| CustomError::LabelMissing {
                    sample: m.id.clone(),
                })
            })
            .collect::<Result<Vec<&str>>>()?;
        let labels: Vec<String> = sample_labels.iter().unique().map(|l| l.to_string()).collect();
        if labels.len() < 2 {
            return Err(CustomError::SingleClass {
                label: labels.first().cloned().unwrap_or_default(),
            });
        }
        let classes: Vec<usize> = sample_labels
            .iter()
            .map(|l| labels.iter().position(|x| x == l).unwrap_or_default())
            .collect();

        info!(
            "Fitting PCA ({} components) on {} background samples x {} sites",
            self.config.n_components,
            background.len(),
            cohort.retained_sites().len()
        );
        let features = background.matrix().view();
        let reduction = ReductionStage::fit(
            features,
            self.config.n_components,
            self.config.whiten,
            self.config.seed,
        )?;
        let reduced = reduction.transform(features);

        info!("Fitting SVM on {} labels: {}", labels.len(), labels.join(", "));
        let classification = ClassificationStage::fit(
            reduced.view(),
            &classes,
            labels.len(),
            &self.config.svc,
            self.config.seed,
        )?;

        Ok(&*self.fitted.insert(FittedModel {
            reduction,
            classification,
            retained_sites: cohort.retained_sites().to_vec(),
            labels,
        }))
    }

    pub fn fitted(&self) -> Result<&FittedModel> {
        self.fitted.as_ref().ok_or(CustomError::FitNotCalled)
    }

    pub fn labels(&self) -> Result<&[String]> {
        Ok(self.fitted()?.labels())
    }

    /// Project rows into the fitted PCA space.
    pub fn transform(&self, features: ArrayView2<f64>) -> Result<Array2<f64>> {
        let fitted = self.fitted()?;
        let expected = fitted.reduction.n_features();
        if features.ncols() != expected {
            return Err(CustomError::DimensionMismatch {
                expected,
                found: features.ncols(),
            });
        }
        Ok(fitted.reduction.transform(features))
    }

    /// Project rows and classify them. With zero rows the prediction and
    /// probability outputs are empty.
    pub fn transform_and_predict(&self, features: ArrayView2<f64>) -> Result<Predictions> {
        let coordinates = self.transform(features)?;
        let fitted = self.fitted()?;
        let n_labels = fitted.labels.len();

        let mut predicted = Vec::with_capacity(coordinates.nrows());
        let mut probabilities = Array2::zeros((coordinates.nrows(), n_labels));
        for (row, mut prob_row) in coordinates.rows().into_iter().zip(probabilities.rows_mut()) {
            predicted.push(fitted.classification.predict(row));
            prob_row.assign(&fitted.classification.predict_proba(row));
        }

        Ok(Predictions {
            coordinates,
            predicted,
            probabilities,
        })
    }
}
