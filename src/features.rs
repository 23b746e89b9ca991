use crate::error::Result;
use crate::model::{AlleleBalance, MISSING_BALANCE, Sample, SampleFeatures, SiteRecord};
use crate::reader::labels::LabelPanel;

/// Reference allele balance of every site, `MISSING_BALANCE` where the total
/// depth is below `min_depth`.
pub fn allele_balance(sites: &[SiteRecord], min_depth: u32) -> AlleleBalance {
    sites
        .iter()
        .map(|site| {
            let depth = site.depth();
            if depth < min_depth as u64 {
                MISSING_BALANCE
            } else {
                site.reference as f64 / depth.max(1) as f64
            }
        })
        .collect()
}

pub fn query_features(sample: &Sample, min_depth: u32) -> SampleFeatures {
    SampleFeatures {
        id: sample.id.clone(),
        label: None,
        balance: allele_balance(&sample.autosomal, min_depth),
    }
}

/// Background samples must be present in the label panel.
pub fn background_features(
    sample: &Sample,
    panel: &LabelPanel,
    min_depth: u32,
) -> Result<SampleFeatures> {
    let label = panel.get(&sample.id)?.to_string();
    Ok(SampleFeatures {
        id: sample.id.clone(),
        label: Some(label),
        balance: allele_balance(&sample.autosomal, min_depth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_DEPTH;
    use crate::error::CustomError;

    #[test]
    fn low_depth_is_missing_regardless_of_reference() {
        let sites = [
            SiteRecord::new(4, 0, 0),
            SiteRecord::new(0, 4, 0),
            SiteRecord::new(2, 1, 1),
            SiteRecord::new(0, 0, 0),
        ];
        let ab = allele_balance(&sites, MIN_DEPTH);
        assert!(ab.iter().all(|&v| v == MISSING_BALANCE));
    }

    #[test]
    fn balance_is_reference_over_total_depth() {
        let sites = [
            SiteRecord::new(5, 0, 0),
            SiteRecord::new(0, 5, 0),
            SiteRecord::new(3, 2, 0),
            SiteRecord::new(3, 3, 4),
        ];
        let ab = allele_balance(&sites, MIN_DEPTH);
        assert_eq!(ab, vec![1.0, 0.0, 0.6, 0.3]);
        assert!(ab.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn depth_does_not_overflow() {
        let sites = [SiteRecord::new(u32::MAX, u32::MAX, u32::MAX)];
        let ab = allele_balance(&sites, MIN_DEPTH);
        assert!((ab[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn background_requires_label() {
        let sample = Sample {
            id: "S1".to_string(),
            autosomal: vec![SiteRecord::new(5, 5, 0)],
            x: vec![],
            y: vec![],
        };
        let panel: LabelPanel = [("S1".to_string(), "EUR".to_string())].into_iter().collect();
        let f = background_features(&sample, &panel, MIN_DEPTH).unwrap();
        assert_eq!(f.label.as_deref(), Some("EUR"));
        assert_eq!(f.balance, vec![0.5]);

        let empty = LabelPanel::default();
        assert!(matches!(
            background_features(&sample, &empty, MIN_DEPTH).unwrap_err(),
            CustomError::LabelMissing { .. }
        ));
    }
}
