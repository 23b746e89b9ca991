use std::path::{Path, PathBuf};

use crate::error::{CustomError, Result};

/// A tab-separated file whose header may be commented (`#sample_id ...`).
/// Lines starting with `##` before the header are skipped.
pub(crate) struct Table {
    pub path: PathBuf,
    pub header: Vec<String>,
    /// (1-based line number, record)
    pub rows: Vec<(usize, csv::StringRecord)>,
}

impl Table {
    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CustomError::MissingColumn {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }
}

pub(crate) fn read_tsv(path: &impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref().to_path_buf();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(&path)
        .map_err(|source| CustomError::CsvRead {
            source,
            path: path.clone(),
        })?;

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| CustomError::CsvRead {
            source,
            path: path.clone(),
        })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line_num = record.position().map_or(0, |p| p.line() as usize);

        match header {
            None => {
                if record.get(0).is_some_and(|f| f.starts_with("##")) {
                    continue;
                }
                header = Some(
                    record
                        .iter()
                        .enumerate()
                        .map(|(i, f)| {
                            let f = f.trim();
                            if i == 0 { f.trim_start_matches('#') } else { f }.to_string()
                        })
                        .collect(),
                );
            }
            Some(_) => rows.push((line_num, record)),
        }
    }

    Ok(Table {
        path,
        header: header.unwrap_or_default(),
        rows,
    })
}
