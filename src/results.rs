use ndarray::Array2;

use crate::ancestry::Predictions;
use crate::cohort::AlignedCohort;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRow {
    /// Population label for background samples, sample id for queries.
    pub name: String,
    pub is_query: bool,
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatesTable {
    /// `PC1`, `PC2`, ...
    pub columns: Vec<String>,
    pub rows: Vec<CoordinateRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRow {
    pub sample: String,
    pub predicted: String,
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilitiesTable {
    pub labels: Vec<String>,
    pub rows: Vec<ProbabilityRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AncestryReport {
    pub labels: Vec<String>,
    pub coordinates: CoordinatesTable,
    /// `None` when there were no query samples.
    pub probabilities: Option<ProbabilitiesTable>,
}

pub fn pc_columns(n_components: usize) -> Vec<String> {
    (1..=n_components).map(|i| format!("PC{i}")).collect()
}

/// Pair the model outputs with sample ids and labels.
pub fn assemble(
    cohort: &AlignedCohort,
    background_coordinates: &Array2<f64>,
    query: &Predictions,
    labels: &[String],
) -> AncestryReport {
    let background_rows = cohort
        .background()
        .members()
        .iter()
        .zip(background_coordinates.rows())
        .map(|(member, coords)| CoordinateRow {
            name: member.label.clone().unwrap_or_else(|| member.id.clone()),
            is_query: false,
            coordinates: coords.to_vec(),
        });
    let query_rows = cohort
        .query()
        .members()
        .iter()
        .zip(query.coordinates.rows())
        .map(|(member, coords)| CoordinateRow {
            name: member.id.clone(),
            is_query: true,
            coordinates: coords.to_vec(),
        });

    let coordinates = CoordinatesTable {
        columns: pc_columns(background_coordinates.ncols()),
        rows: background_rows.chain(query_rows).collect(),
    };

    let probabilities = (!cohort.query().is_empty()).then(|| ProbabilitiesTable {
        labels: labels.to_vec(),
        rows: cohort
            .query()
            .members()
            .iter()
            .zip(&query.predicted)
            .zip(query.probabilities.rows())
            .map(|((member, &predicted), probs)| ProbabilityRow {
                sample: member.id.clone(),
                predicted: labels[predicted].clone(),
                probabilities: probs.to_vec(),
            })
            .collect(),
    });

    AncestryReport {
        labels: labels.to_vec(),
        coordinates,
        probabilities,
    }
}
