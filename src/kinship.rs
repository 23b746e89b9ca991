//! Flags sample pairs that share too few IBS0 sites for two samples that were
//! expected to be unrelated.

use itertools::Itertools;

use crate::reader::pairs::PairRecord;

/// `expected_relatedness` value of a pair expected to be unrelated.
pub const UNRELATED: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinshipThresholds {
    /// Unrelated pairs sharing fewer IBS0 sites than this are flagged.
    pub max_unrelated_ibs0: f64,
}

impl Default for KinshipThresholds {
    fn default() -> Self {
        Self {
            max_unrelated_ibs0: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: &'static str,
    pub n_pairs: usize,
    pub n_flagged: usize,
}

fn group_name(pair: &PairRecord) -> &'static str {
    if pair.expected_relatedness == UNRELATED {
        "unrelated"
    } else {
        "identical"
    }
}

pub fn is_unexpected(pair: &PairRecord, thresholds: &KinshipThresholds) -> bool {
    pair.expected_relatedness == UNRELATED && pair.ibs0 < thresholds.max_unrelated_ibs0
}

pub fn flag_unexpected<'a>(
    pairs: &'a [PairRecord],
    thresholds: &KinshipThresholds,
) -> Vec<&'a PairRecord> {
    pairs.iter().filter(|p| is_unexpected(p, thresholds)).collect()
}

/// Pair and flag counts per expected-relatedness group, in order of first
/// appearance.
pub fn summarize(pairs: &[PairRecord], thresholds: &KinshipThresholds) -> Vec<GroupSummary> {
    pairs
        .iter()
        .map(group_name)
        .unique()
        .map(|group| {
            let members = pairs.iter().filter(|p| group_name(p) == group);
            let (n_pairs, n_flagged) = members.fold((0, 0), |(n, f), p| {
                (n + 1, f + usize::from(is_unexpected(p, thresholds)))
            });
            GroupSummary {
                group,
                n_pairs,
                n_flagged,
            }
        })
        .collect()
}
