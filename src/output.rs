use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;
use serde_json::json;

use crate::cohort::{AlignedCohort, Member};
use crate::error::{CustomError, Result};
use crate::kinship::GroupSummary;
use crate::reader::pairs::PairRecord;
use crate::results::{CoordinatesTable, ProbabilitiesTable};

fn flush<W: Write>(wtr: &mut csv::Writer<W>, path: &Path) -> Result<()> {
    wtr.flush().map_err(|e| CustomError::Write {
        source: e,
        path: path.into(),
    })
}

pub fn write_coordinates(table: &CoordinatesTable, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(std::iter::once("ancestry").chain(table.columns.iter().map(String::as_str)))?;
    for row in &table.rows {
        let mut record = vec![row.name.clone()];
        record.extend(row.coordinates.iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }
    flush(&mut wtr, path)
}

pub fn write_probabilities(table: &ProbabilitiesTable, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(
        ["#sample", "predicted_ancestry"]
            .into_iter()
            .chain(table.labels.iter().map(String::as_str)),
    )?;
    for row in &table.rows {
        let mut record = vec![row.sample.clone(), row.predicted.clone()];
        record.extend(row.probabilities.iter().map(|p| format!("{p:.2}")));
        wtr.write_record(&record)?;
    }
    flush(&mut wtr, path)
}

pub fn write_background_matrix(matrix: &Array2<f64>, path: &Path) -> Result<()> {
    ndarray_npy::write_npy(path, matrix).map_err(|e| CustomError::NpyWrite {
        source: e,
        path: path.into(),
    })
}

pub fn write_summary(cohort: &AlignedCohort, labels: &[String], seed: u64, path: &Path) -> Result<()> {
    let ids = |members: &[Member]| -> Vec<String> {
        members.iter().map(|m| m.id.clone()).collect()
    };
    let summary = json!({
        "labels": labels,
        "n_sites": cohort.n_sites(),
        "retained_sites": cohort.retained_sites(),
        "background_samples": ids(cohort.background().members()),
        "query_samples": ids(cohort.query().members()),
        "seed": seed,
    });

    let file = File::create(path).map_err(|e| CustomError::Write {
        source: e,
        path: path.into(),
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &summary).map_err(|e| CustomError::Json {
        source: e,
        path: path.into(),
    })?;
    writer.flush().map_err(|e| CustomError::Write {
        source: e,
        path: path.into(),
    })
}

pub fn write_flagged_pairs(pairs: &[&PairRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["sample_a", "sample_b", "ibs0", "ibs2", "expected_relatedness"])?;
    for pair in pairs {
        wtr.serialize((
            pair.sample_a.as_str(),
            pair.sample_b.as_str(),
            pair.ibs0,
            pair.ibs2,
            pair.expected_relatedness,
        ))?;
    }
    flush(&mut wtr, path)
}

pub fn write_kinship_summary(summary: &[GroupSummary], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["expected", "n_pairs", "n_flagged"])?;
    for group in summary {
        wtr.serialize((group.group, group.n_pairs, group.n_flagged))?;
    }
    flush(&mut wtr, path)
}
