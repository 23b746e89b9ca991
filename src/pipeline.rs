use log::info;

use crate::ancestry::AncestryModel;
use crate::cohort::{AlignedCohort, align};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{background_features, query_features};
use crate::model::{Cohort, Sample};
use crate::reader::labels::LabelPanel;
use crate::results::{AncestryReport, assemble};

pub struct PipelineOutput {
    pub aligned: AlignedCohort,
    pub report: AncestryReport,
}

/// Derive allele balances for every sample. Every background sample needs a
/// label in `panel`.
pub fn build_cohort(
    background: &[Sample],
    query: &[Sample],
    panel: &LabelPanel,
    min_depth: u32,
) -> Result<Cohort> {
    Ok(Cohort {
        background: background
            .iter()
            .map(|s| background_features(s, panel, min_depth))
            .collect::<Result<_>>()?,
        query: query.iter().map(|s| query_features(s, min_depth)).collect(),
    })
}

pub fn predict_ancestry(cohort: &Cohort, config: &PipelineConfig) -> Result<PipelineOutput> {
    let aligned = align(cohort, &config.thresholds)?;

    let mut model = AncestryModel::new(config.model);
    model.fit(&aligned)?;
    let background_coordinates = model.transform(aligned.background().matrix().view())?;
    let query = model.transform_and_predict(aligned.query().matrix().view())?;
    info!(
        "Projected {} background and {} query samples",
        background_coordinates.nrows(),
        query.coordinates.nrows()
    );

    let report = assemble(&aligned, &background_coordinates, &query, model.labels()?);
    Ok(PipelineOutput { aligned, report })
}
