pub mod labels;
pub mod pairs;
pub mod somalier;
mod tsv;
