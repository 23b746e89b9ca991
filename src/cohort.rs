use log::{debug, info};
use ndarray::Array2;

use crate::config::MissingnessThresholds;
use crate::error::{CustomError, Result};
use crate::model::{Cohort, SampleFeatures};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub label: Option<String>,
}

/// Samples of one group and their features restricted to the retained sites.
/// Row `i` of the matrix belongs to `members[i]`.
#[derive(Debug, Clone)]
pub struct AlignedGroup {
    members: Vec<Member>,
    matrix: Array2<f64>,
}

impl AlignedGroup {
    fn select(group: &[SampleFeatures], sites: &[usize]) -> Self {
        let members = group
            .iter()
            .map(|s| Member {
                id: s.id.clone(),
                label: s.label.clone(),
            })
            .collect();
        let matrix = Array2::from_shape_fn((group.len(), sites.len()), |(row, col)| {
            group[row].balance[sites[col]]
        });
        Self { members, matrix }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AlignedCohort {
    n_sites: usize,
    retained_sites: Vec<usize>,
    background: AlignedGroup,
    query: AlignedGroup,
}

impl AlignedCohort {
    /// Number of sites before filtering.
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Original indices of the kept sites, ascending.
    pub fn retained_sites(&self) -> &[usize] {
        &self.retained_sites
    }

    pub fn background(&self) -> &AlignedGroup {
        &self.background
    }

    pub fn query(&self) -> &AlignedGroup {
        &self.query
    }

    /// True when every site was filtered out.
    pub fn is_empty(&self) -> bool {
        self.retained_sites.is_empty()
    }
}

/// Fraction of samples in `group` missing each site.
pub fn missingness(group: &[SampleFeatures], n_sites: usize) -> Vec<f64> {
    let mut missing = vec![0usize; n_sites];
    for sample in group {
        for (site, count) in missing.iter_mut().enumerate() {
            if sample.is_missing(site) {
                *count += 1;
            }
        }
    }
    missing
        .into_iter()
        .map(|count| count as f64 / group.len().max(1) as f64)
        .collect()
}

fn check_site_counts(cohort: &Cohort) -> Result<usize> {
    let first = cohort
        .background
        .first()
        .ok_or(CustomError::SampleCount { n_samples: 0 })?;
    let n_sites = first.n_sites();
    if let Some(bad) = cohort
        .background
        .iter()
        .chain(&cohort.query)
        .find(|s| s.n_sites() != n_sites)
    {
        return Err(CustomError::SiteCountMismatch {
            sample: bad.id.clone(),
            expected: n_sites,
            found: bad.n_sites(),
        });
    }
    Ok(n_sites)
}

/// Indices of the sites that pass both missingness thresholds. The query
/// threshold only applies when the query group is non-empty.
pub fn retained_sites(cohort: &Cohort, thresholds: &MissingnessThresholds) -> Result<Vec<usize>> {
    let n_sites = check_site_counts(cohort)?;
    let background_rates = missingness(&cohort.background, n_sites);
    let query_rates = if cohort.query.is_empty() {
        None
    } else {
        Some(missingness(&cohort.query, n_sites))
    };

    Ok((0..n_sites)
        .filter(|&site| {
            let drop_background = background_rates[site] > thresholds.background;
            let drop_query = query_rates
                .as_ref()
                .is_some_and(|rates| rates[site] > thresholds.query);
            !(drop_background || drop_query)
        })
        .collect())
}

pub fn align(cohort: &Cohort, thresholds: &MissingnessThresholds) -> Result<AlignedCohort> {
    let n_sites = check_site_counts(cohort)?;
    let retained = retained_sites(cohort, thresholds)?;
    info!(
        "Kept {}/{} sites after missingness filtering",
        retained.len(),
        n_sites
    );
    debug!(
        "Missingness thresholds: background > {}, query > {}",
        thresholds.background, thresholds.query
    );

    Ok(AlignedCohort {
        n_sites,
        background: AlignedGroup::select(&cohort.background, &retained),
        query: AlignedGroup::select(&cohort.query, &retained),
        retained_sites: retained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MISSING_BALANCE;

    const M: f64 = MISSING_BALANCE;

    fn sample(id: &str, label: Option<&str>, balance: &[f64]) -> SampleFeatures {
        SampleFeatures {
            id: id.to_string(),
            label: label.map(str::to_string),
            balance: balance.to_vec(),
        }
    }

    fn background_with_missing(n_samples: usize, n_missing: usize) -> Vec<SampleFeatures> {
        (0..n_samples)
            .map(|i| {
                let first = if i < n_missing { M } else { 0.5 };
                sample(&format!("bg{i}"), Some("A"), &[first, 0.4])
            })
            .collect()
    }

    #[test]
    fn missingness_exactly_at_threshold_is_retained() {
        let cohort = Cohort {
            background: background_with_missing(10, 3),
            query: vec![],
        };
        let kept = retained_sites(&cohort, &MissingnessThresholds::default()).unwrap();
        assert_eq!(kept, vec![0, 1]);

        let cohort = Cohort {
            background: background_with_missing(10, 4),
            query: vec![],
        };
        let kept = retained_sites(&cohort, &MissingnessThresholds::default()).unwrap();
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn query_missingness_drops_sites_from_both_groups() {
        let cohort = Cohort {
            background: vec![
                sample("b1", Some("A"), &[0.1, 0.2, 0.3, 0.4]),
                sample("b2", Some("B"), &[0.5, 0.6, 0.7, 0.8]),
            ],
            query: vec![
                sample("q1", None, &[0.0, M, 1.0, M]),
                sample("q2", None, &[0.0, M, M, 1.0]),
            ],
        };
        let aligned = align(&cohort, &MissingnessThresholds::default()).unwrap();
        // query rates: 0.0, 1.0, 0.5, 0.5
        assert_eq!(aligned.retained_sites(), &[0]);
        assert_eq!(aligned.background().matrix().dim(), (2, 1));
        assert_eq!(aligned.query().matrix().dim(), (2, 1));
        assert_eq!(aligned.background().matrix()[[1, 0]], 0.5);
        assert_eq!(aligned.query().members()[1].id, "q2");
    }

    #[test]
    fn dropping_one_site_keeps_other_columns_in_order() {
        let cohort = Cohort {
            background: vec![
                sample("b1", Some("A"), &[0.1, M, 0.3, 0.4]),
                sample("b2", Some("B"), &[0.5, M, 0.7, 0.8]),
                sample("b3", Some("B"), &[0.9, 0.2, 0.6, 0.0]),
            ],
            query: vec![sample("q1", None, &[0.2, 0.2, 0.2, 0.2])],
        };
        let aligned = align(&cohort, &MissingnessThresholds::default()).unwrap();
        assert_eq!(aligned.retained_sites(), &[0, 2, 3]);
        let bg = aligned.background().matrix();
        assert_eq!(bg.nrows(), 3);
        assert_eq!(bg.row(2).to_vec(), vec![0.9, 0.6, 0.0]);
        assert_eq!(aligned.query().matrix().row(0).to_vec(), vec![0.2, 0.2, 0.2]);
    }

    #[test]
    fn tighter_thresholds_never_keep_more_sites() {
        let background: Vec<_> = (0..10)
            .map(|i| {
                let balance: Vec<f64> = (0..10).map(|site| if i < site { M } else { 0.5 }).collect();
                sample(&format!("bg{i}"), Some("A"), &balance)
            })
            .collect();
        let query: Vec<_> = (0..5)
            .map(|i| {
                let balance: Vec<f64> = (0..10).map(|site| if (i + site) % 3 == 0 { M } else { 0.5 }).collect();
                sample(&format!("q{i}"), None, &balance)
            })
            .collect();
        let cohort = Cohort { background, query };

        let mut previous: Option<Vec<usize>> = None;
        for step in (0..=10).rev() {
            let t = step as f64 / 10.0;
            let thresholds = MissingnessThresholds {
                background: t,
                query: t,
            };
            let kept = retained_sites(&cohort, &thresholds).unwrap();
            if let Some(prev) = &previous {
                assert!(kept.iter().all(|site| prev.contains(site)));
            }
            previous = Some(kept);
        }
    }

    #[test]
    fn all_missing_background_yields_empty_matrix() {
        let cohort = Cohort {
            background: vec![
                sample("b1", Some("A"), &[M; 10]),
                sample("b2", Some("B"), &[0.5; 10]),
            ],
            query: vec![],
        };
        // b1 alone has missingness 0.5 at every site
        let aligned = align(&cohort, &MissingnessThresholds::default()).unwrap();
        assert!(aligned.is_empty());
        assert_eq!(aligned.n_sites(), 10);
        assert_eq!(aligned.background().matrix().dim(), (2, 0));
    }

    #[test]
    fn rejects_samples_with_other_site_count() {
        let cohort = Cohort {
            background: vec![sample("b1", Some("A"), &[0.5; 3])],
            query: vec![sample("q1", None, &[0.5; 4])],
        };
        match align(&cohort, &MissingnessThresholds::default()).unwrap_err() {
            CustomError::SiteCountMismatch {
                sample,
                expected,
                found,
            } => {
                assert_eq!(sample, "q1");
                assert_eq!(expected, 3);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_background_is_rejected() {
        let cohort = Cohort::default();
        assert!(matches!(
            align(&cohort, &MissingnessThresholds::default()).unwrap_err(),
            CustomError::SampleCount { n_samples: 0 }
        ));
    }
}
