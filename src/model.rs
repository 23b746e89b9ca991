/// Value marking a site whose depth is too low to compute an allele balance.
pub const MISSING_BALANCE: f64 = -1.0;

/// Allele depths observed at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiteRecord {
    pub reference: u32,
    pub alternate: u32,
    pub other: u32,
}

impl SiteRecord {
    pub fn new(reference: u32, alternate: u32, other: u32) -> Self {
        Self {
            reference,
            alternate,
            other,
        }
    }

    pub fn depth(&self) -> u64 {
        self.reference as u64 + self.alternate as u64 + self.other as u64
    }
}

/// Content of one `.somalier` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id: String,
    pub autosomal: Vec<SiteRecord>,
    pub x: Vec<SiteRecord>,
    pub y: Vec<SiteRecord>,
}

/// Per-site reference allele balance, `MISSING_BALANCE` where depth is insufficient.
pub type AlleleBalance = Vec<f64>;

/// One sample entering the pipeline: id, optional population label, features.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFeatures {
    pub id: String,
    pub label: Option<String>,
    pub balance: AlleleBalance,
}

impl SampleFeatures {
    pub fn n_sites(&self) -> usize {
        self.balance.len()
    }

    pub fn is_missing(&self, site: usize) -> bool {
        self.balance[site] == MISSING_BALANCE
    }
}

/// Background (labelled) and query (unlabelled) samples of one run.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    pub background: Vec<SampleFeatures>,
    pub query: Vec<SampleFeatures>,
}
