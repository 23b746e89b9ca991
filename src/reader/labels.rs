use std::collections::HashMap;
use std::path::Path;

use crate::error::{CustomError, Result};
use crate::reader::tsv::read_tsv;

pub const DEFAULT_LABEL_COLUMN: &str = "superpop";

/// Population label of every background sample, keyed by sample id.
#[derive(Debug, Clone, Default)]
pub struct LabelPanel {
    labels: HashMap<String, String>,
}

impl LabelPanel {
    /// Read a tab-separated panel. The first column holds sample ids; labels
    /// are taken from the column named `label_column`.
    pub fn read(path: &impl AsRef<Path>, label_column: &str) -> Result<Self> {
        let table = read_tsv(path)?;
        let label_idx = table.column(label_column)?;

        let mut labels = HashMap::with_capacity(table.rows.len());
        for (_, record) in &table.rows {
            let (Some(id), Some(label)) = (record.get(0), record.get(label_idx)) else {
                continue;
            };
            labels.insert(id.trim().to_string(), label.trim().to_string());
        }
        Ok(Self { labels })
    }

    pub fn get(&self, sample: &str) -> Result<&str> {
        self.labels
            .get(sample)
            .map(String::as_str)
            .ok_or_else(|| CustomError::LabelMissing {
                sample: sample.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for LabelPanel {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}
