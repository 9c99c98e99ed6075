// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Agreement Statistics
// ─────────────────────────────────────────────────────────────────────
//! Agreement between two sets of per-trait 1–7 scores — typically the
//! adaptive projection against the fixed-form survey means. Non-finite
//! intermediate values (zero-variance correlation, empty overlap) are
//! reported as 0.0 rather than propagated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dose_types::TraitDomain;

/// Agreement summary between two score sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComparison {
    /// Traits present in both inputs, canonical order.
    pub traits_compared: Vec<TraitDomain>,
    pub pearson_r: f64,
    pub mean_absolute_error: f64,
    pub rmse: f64,
    /// Signed first−second difference per compared trait.
    pub trait_differences: BTreeMap<TraitDomain, f64>,
}

fn safe(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Compare two per-trait score maps over their common traits.
pub fn compare_scores(
    first: &BTreeMap<TraitDomain, f64>,
    second: &BTreeMap<TraitDomain, f64>,
) -> ScoreComparison {
    let traits: Vec<TraitDomain> = TraitDomain::ALL
        .iter()
        .copied()
        .filter(|t| first.contains_key(t) && second.contains_key(t))
        .collect();

    if traits.is_empty() {
        return ScoreComparison {
            traits_compared: traits,
            pearson_r: 0.0,
            mean_absolute_error: 0.0,
            rmse: 0.0,
            trait_differences: BTreeMap::new(),
        };
    }

    let a: Vec<f64> = traits.iter().map(|t| first[t]).collect();
    let b: Vec<f64> = traits.iter().map(|t| second[t]).collect();
    let n = traits.len() as f64;

    let diffs: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x - y).collect();
    let mae = diffs.iter().map(|d| d.abs()).sum::<f64>() / n;
    let rmse = (diffs.iter().map(|d| d * d).sum::<f64>() / n).sqrt();

    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(&b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    let pearson_r = safe(cov / (va * vb).sqrt());

    ScoreComparison {
        trait_differences: traits
            .iter()
            .zip(&diffs)
            .map(|(t, d)| (*t, safe(*d)))
            .collect(),
        traits_compared: traits,
        pearson_r,
        mean_absolute_error: safe(mae),
        rmse: safe(rmse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(values: &[(TraitDomain, f64)]) -> BTreeMap<TraitDomain, f64> {
        values.iter().copied().collect()
    }

    fn full_map(values: [f64; 6]) -> BTreeMap<TraitDomain, f64> {
        TraitDomain::ALL.iter().copied().zip(values).collect()
    }

    #[test]
    fn test_identical_scores() {
        let scores = full_map([4.1, 3.2, 5.0, 2.7, 4.4, 3.9]);
        let cmp = compare_scores(&scores, &scores);
        assert_eq!(cmp.traits_compared.len(), 6);
        assert!((cmp.pearson_r - 1.0).abs() < 1e-12);
        assert!(cmp.mean_absolute_error.abs() < 1e-12);
        assert!(cmp.rmse.abs() < 1e-12);
        assert!(cmp.trait_differences.values().all(|d| d.abs() < 1e-12));
    }

    #[test]
    fn test_constant_offset() {
        let a = full_map([4.0, 3.0, 5.0, 2.0, 4.5, 3.5]);
        let b = full_map([4.5, 3.5, 5.5, 2.5, 5.0, 4.0]);
        let cmp = compare_scores(&a, &b);
        // Shifting preserves correlation; errors equal the shift.
        assert!((cmp.pearson_r - 1.0).abs() < 1e-9);
        assert!((cmp.mean_absolute_error - 0.5).abs() < 1e-12);
        assert!((cmp.rmse - 0.5).abs() < 1e-12);
        assert!((cmp.trait_differences[&TraitDomain::Openness] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_anticorrelated() {
        let a = full_map([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = full_map([6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let cmp = compare_scores(&a, &b);
        assert!((cmp.pearson_r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_reports_zero() {
        let a = full_map([4.0; 6]);
        let b = full_map([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let cmp = compare_scores(&a, &b);
        assert_eq!(cmp.pearson_r, 0.0);
        assert!(cmp.rmse.is_finite());
    }

    #[test]
    fn test_partial_overlap() {
        let a = map(&[
            (TraitDomain::Extraversion, 4.0),
            (TraitDomain::Neuroticism, 3.0),
        ]);
        let b = map(&[
            (TraitDomain::Neuroticism, 5.0),
            (TraitDomain::Openness, 2.0),
        ]);
        let cmp = compare_scores(&a, &b);
        assert_eq!(cmp.traits_compared, vec![TraitDomain::Neuroticism]);
        assert!((cmp.mean_absolute_error - 2.0).abs() < 1e-12);
        // One pair has no variance; correlation degrades to zero.
        assert_eq!(cmp.pearson_r, 0.0);
    }

    #[test]
    fn test_no_overlap() {
        let a = map(&[(TraitDomain::Extraversion, 4.0)]);
        let b = map(&[(TraitDomain::Openness, 2.0)]);
        let cmp = compare_scores(&a, &b);
        assert!(cmp.traits_compared.is_empty());
        assert_eq!(cmp.pearson_r, 0.0);
        assert_eq!(cmp.rmse, 0.0);
    }
}
