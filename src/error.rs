use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not create output directory")]
    OutputDir {
        #[source]
        source: std::io::Error,
    },

    #[error("could not read CSV/TSV file {path}")]
    CsvRead {
        #[source]
        source: csv::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to CSV")]
    CsvWrite(#[from] csv::Error),

    #[error("could not write array to {path}")]
    NpyWrite {
        #[source]
        source: ndarray_npy::WriteNpyError,
        path: std::path::PathBuf,
    },

    #[error("could not write JSON to {path}")]
    Json {
        #[source]
        source: serde_json::Error,
        path: std::path::PathBuf,
    },

    #[error("could not build thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid site-count file {path}")]
    SampleFile {
        #[source]
        source: Box<CustomError>,
        path: std::path::PathBuf,
    },

    #[error("unsupported somalier format version {found} (expected {expected})")]
    SomalierVersion { found: u8, expected: u8 },

    #[error("truncated {section}: need {needed} bytes but only {available} remain")]
    SomalierTruncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("sample id is not valid UTF-8")]
    SomalierSampleId {
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{extra} unexpected bytes after the declared site records")]
    SomalierTrailingBytes { extra: usize },

    #[error("cannot encode {what} of length {len} (maximum {max})")]
    SomalierEncodeLength {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("sample {sample} has {found} autosomal sites but the background has {expected}")]
    SiteCountMismatch {
        sample: String,
        expected: usize,
        found: usize,
    },

    #[error("background sample {sample} has no entry in the label panel")]
    LabelMissing { sample: String },

    #[error("column \"{column}\" not found in header of {path}")]
    MissingColumn {
        column: String,
        path: std::path::PathBuf,
    },

    #[error("could not parse {column}=\"{value}\" in line {line_num} of {path}")]
    PairsValue {
        column: String,
        value: String,
        line_num: usize,
        path: std::path::PathBuf,
    },

    #[error("need at least 2 background samples (got {n_samples})")]
    SampleCount { n_samples: usize },

    #[error("need at least 2 distinct background labels (only found \"{label}\")")]
    SingleClass { label: String },

    #[error("no sites left after missingness filtering")]
    NoRetainedSites,

    #[error("singular value decomposition did not converge")]
    Decomposition,

    #[error("could not train support vector machine")]
    SvmFit {
        #[source]
        source: linfa_svm::SvmError,
    },

    #[error("ancestry model used before fit was called")]
    FitNotCalled,

    #[error("expected {expected} feature columns (got {found})")]
    DimensionMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, CustomError>;
