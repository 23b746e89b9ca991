use std::path::Path;

use crate::error::{CustomError, Result};
use crate::reader::tsv::read_tsv;

/// Relatedness statistics of one sample pair, as written by `somalier relate`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub sample_a: String,
    pub sample_b: String,
    pub ibs0: f64,
    pub ibs2: f64,
    pub expected_relatedness: f64,
}

pub fn read_pairs(path: &impl AsRef<Path>) -> Result<Vec<PairRecord>> {
    let table = read_tsv(path)?;
    let a_idx = table.column("sample_a")?;
    let b_idx = table.column("sample_b")?;
    let ibs0_idx = table.column("ibs0")?;
    let ibs2_idx = table.column("ibs2")?;
    let expected_idx = table.column("expected_relatedness")?;

    fn field(record: &csv::StringRecord, idx: usize) -> &str {
        record.get(idx).unwrap_or("").trim()
    }
    let number = |record: &csv::StringRecord, idx: usize, line_num: usize| -> Result<f64> {
        let value = field(record, idx);
        value.parse::<f64>().map_err(|_| CustomError::PairsValue {
            column: table.header[idx].clone(),
            value: value.to_string(),
            line_num,
            path: table.path.clone(),
        })
    };

    table
        .rows
        .iter()
        .map(|(line_num, record)| {
            Ok(PairRecord {
                sample_a: field(record, a_idx).to_string(),
                sample_b: field(record, b_idx).to_string(),
                ibs0: number(record, ibs0_idx, *line_num)?,
                ibs2: number(record, ibs2_idx, *line_num)?,
                expected_relatedness: number(record, expected_idx, *line_num)?,
            })
        })
        .collect()
}
