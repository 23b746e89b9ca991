//! Parameters of the ancestry pipeline.
//!
//! The `Default` implementations hold the values the predictions are
//! calibrated for. Changing any of them changes the output of the tool.

/// Sites supported by fewer reads than this are marked missing.
pub const MIN_DEPTH: u32 = 5;
/// A site is dropped when more than this fraction of background samples miss it.
pub const MAX_BACKGROUND_MISSINGNESS: f64 = 0.30;
/// A site is dropped when more than this fraction of query samples miss it.
pub const MAX_QUERY_MISSINGNESS: f64 = 0.40;
pub const N_COMPONENTS: usize = 5;
pub const SVC_C: f64 = 3.0;
pub const SVC_TOLERANCE: f64 = 1e-3;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingnessThresholds {
    pub background: f64,
    pub query: f64,
}

impl Default for MissingnessThresholds {
    fn default() -> Self {
        Self {
            background: MAX_BACKGROUND_MISSINGNESS,
            query: MAX_QUERY_MISSINGNESS,
        }
    }
}

/// RBF kernel coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / n_features`
    Auto,
    Value(f64),
}

impl Gamma {
    pub fn resolve(self, n_features: usize) -> f64 {
        match self {
            Gamma::Auto => 1.0 / n_features.max(1) as f64,
            Gamma::Value(g) => g,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvcParams {
    pub c: f64,
    pub gamma: Gamma,
    pub tolerance: f64,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: SVC_C,
            gamma: Gamma::Auto,
            tolerance: SVC_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub n_components: usize,
    pub whiten: bool,
    pub seed: u64,
    pub svc: SvcParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_components: N_COMPONENTS,
            whiten: true,
            seed: DEFAULT_SEED,
            svc: SvcParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub min_depth: u32,
    pub thresholds: MissingnessThresholds,
    pub model: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_depth: MIN_DEPTH,
            thresholds: MissingnessThresholds::default(),
            model: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            model: ModelConfig {
                seed,
                ..ModelConfig::default()
            },
            ..Self::default()
        }
    }
}
