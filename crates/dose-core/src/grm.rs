// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — GRM Probability Kernel
// ─────────────────────────────────────────────────────────────────────
//! Samejima's Graded Response Model for 7-point polytomous items.
//!
//! Cumulative category function for threshold k:
//!
//!   P*(θ, k) = 1 / (1 + exp(−α·(θ − βₖ)))
//!
//! with the boundary conventions P*(θ, 0) ≡ 1 and P*(θ, 7) ≡ 0, so the
//! probability of answering in category k ∈ 1..7 is
//!
//!   Pₖ(θ) = P*(θ, k−1) − P*(θ, k).
//!
//! The kernel is unaware of reverse scoring; it always receives
//! canonicalized categories.

use dose_bank::Item;
use dose_types::{DoseError, DoseResult};

/// Number of response categories on the Likert scale.
pub const CATEGORIES: usize = 7;

/// Probability floor preventing log-of-zero in posterior updates.
pub const PROB_FLOOR: f64 = 1e-12;

/// Cumulative probability of responding at or above a threshold.
#[inline]
pub fn cumulative_prob(alpha: f64, beta: f64, theta: f64) -> f64 {
    // Clamp the exponent so extreme grids cannot overflow exp().
    let z = (alpha * (theta - beta)).clamp(-700.0, 700.0);
    1.0 / (1.0 + (-z).exp())
}

fn validate_item(item: &Item) -> DoseResult<()> {
    if !item.alpha.is_finite() || item.alpha <= 0.0 {
        return Err(DoseError::InvalidItem(format!(
            "item {}: alpha must be positive, got {}",
            item.number, item.alpha
        )));
    }
    if item.beta.iter().any(|b| !b.is_finite()) {
        return Err(DoseError::InvalidItem(format!(
            "item {}: non-finite threshold",
            item.number
        )));
    }
    Ok(())
}

/// Cumulative functions P*(θ, 0..=7) including both boundary conventions.
#[inline]
fn cumulatives(item: &Item, theta: f64) -> [f64; CATEGORIES + 1] {
    let mut cum = [0.0; CATEGORIES + 1];
    cum[0] = 1.0;
    for (k, beta) in item.beta.iter().enumerate() {
        cum[k + 1] = cumulative_prob(item.alpha, *beta, theta);
    }
    cum[CATEGORIES] = 0.0;
    cum
}

/// Probability of each response category 1..=7 at latent value θ.
///
/// Every entry is strictly positive (floored at [`PROB_FLOOR`]) and the
/// vector sums to 1 within 1e-9. Near-tied thresholds produce near-zero
/// adjacent-difference probabilities; the floor absorbs them.
pub fn category_probs(item: &Item, theta: f64) -> [f64; CATEGORIES] {
    let cum = cumulatives(item, theta);
    let mut probs = [0.0; CATEGORIES];
    let mut sum = 0.0;
    for k in 0..CATEGORIES {
        // Non-monotone thresholds can yield tiny negatives; floor them.
        probs[k] = (cum[k] - cum[k + 1]).max(PROB_FLOOR);
        sum += probs[k];
    }
    for p in probs.iter_mut() {
        *p /= sum;
    }
    probs
}

/// Fisher information of an item at latent value θ.
///
/// For the polytomous GRM:
///
///   I(θ) = α² · Σₖ (P*'ₖ₋₁ − P*'ₖ)² / Pₖ,   P*'ⱼ = P*ⱼ·(1 − P*ⱼ)
///
/// with zero boundary derivatives. Fails with `InvalidItem` on α ≤ 0 or
/// a non-finite threshold.
pub fn fisher_information(item: &Item, theta: f64) -> DoseResult<f64> {
    validate_item(item)?;

    let cum = cumulatives(item, theta);
    let probs = category_probs(item, theta);

    let mut deriv = [0.0; CATEGORIES + 1];
    for j in 1..CATEGORIES {
        deriv[j] = cum[j] * (1.0 - cum[j]);
    }
    // deriv[0] and deriv[7] stay 0 (constant boundaries).

    let mut info = 0.0;
    for k in 0..CATEGORIES {
        let d = deriv[k] - deriv[k + 1];
        info += d * d / probs[k];
    }
    Ok(item.alpha * item.alpha * info)
}

/// Expected response E[X|θ] = Σ k·Pₖ(θ) on the 1..7 scale.
pub fn expected_score(item: &Item, theta: f64) -> f64 {
    category_probs(item, theta)
        .iter()
        .enumerate()
        .map(|(k, p)| (k + 1) as f64 * p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dose_bank::ItemBank;
    use dose_types::TraitDomain;

    fn item(number: u8) -> Item {
        *ItemBank::builtin().item(number).unwrap()
    }

    #[test]
    fn test_cumulative_midpoint() {
        // At θ = β the logistic sits exactly at one half.
        assert!((cumulative_prob(1.2, 0.7, 0.7) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_extremes() {
        assert!(cumulative_prob(1.0, 0.0, 50.0) > 1.0 - 1e-12);
        assert!(cumulative_prob(1.0, 0.0, -50.0) < 1e-12);
    }

    #[test]
    fn test_probs_sum_to_one() {
        for number in [1, 2, 18] {
            let item = item(number);
            for theta in [-4.0, -1.3, 0.0, 0.7, 4.0] {
                let probs = category_probs(&item, theta);
                let sum: f64 = probs.iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "item {number} θ={theta}");
            }
        }
    }

    #[test]
    fn test_probs_strictly_positive() {
        let item = item(2);
        for theta in [-4.0, 0.0, 4.0] {
            assert!(category_probs(&item, theta).iter().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_extreme_theta_concentrates_mass() {
        let item = item(1);
        let low = category_probs(&item, -4.0);
        let high = category_probs(&item, 4.0);
        assert!(low[0] > 0.9, "low θ should answer category 1");
        assert!(high[6] > 0.7, "high θ should answer category 7");
    }

    #[test]
    fn test_fisher_nonnegative() {
        for item in ItemBank::builtin().items() {
            for theta in [-3.0, 0.0, 3.0] {
                let info = fisher_information(item, theta).unwrap();
                assert!(info >= 0.0 && info.is_finite());
            }
        }
    }

    #[test]
    fn test_fisher_peaks_near_thresholds() {
        // Neuroticism item 4 has thresholds centred right of zero, so it
        // is more informative at θ = 1 than far out at θ = -4.
        let item = item(4);
        let near = fisher_information(&item, 1.0).unwrap();
        let far = fisher_information(&item, -4.0).unwrap();
        assert!(near > far);
    }

    #[test]
    fn test_fisher_rejects_bad_alpha() {
        let bad = Item {
            number: 99,
            domain: TraitDomain::Extraversion,
            reverse: false,
            alpha: -0.5,
            beta: [0.0; 6],
        };
        assert!(matches!(
            fisher_information(&bad, 0.0),
            Err(DoseError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_fisher_rejects_nonfinite_beta() {
        let bad = Item {
            number: 99,
            domain: TraitDomain::Extraversion,
            reverse: false,
            alpha: 1.0,
            beta: [0.0, 0.0, f64::INFINITY, 0.0, 0.0, 0.0],
        };
        assert!(fisher_information(&bad, 0.0).is_err());
    }

    #[test]
    fn test_near_tied_thresholds_tolerated() {
        let flat = Item {
            number: 99,
            domain: TraitDomain::Openness,
            reverse: false,
            alpha: 1.3,
            beta: [-0.5, -0.5, -0.5, 0.5, 0.5, 0.5],
        };
        let probs = category_probs(&flat, 0.0);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|&p| p > 0.0));
        assert!(fisher_information(&flat, 0.0).unwrap().is_finite());
    }

    #[test]
    fn test_expected_score_symmetric_item() {
        let symmetric = Item {
            number: 99,
            domain: TraitDomain::Extraversion,
            reverse: false,
            alpha: 1.0,
            beta: [-2.5, -1.5, -0.5, 0.5, 1.5, 2.5],
        };
        assert!((expected_score(&symmetric, 0.0) - 4.0).abs() < 1e-9);
        assert!(expected_score(&symmetric, 3.0) > 5.5);
        assert!(expected_score(&symmetric, -3.0) < 2.5);
    }

    #[test]
    fn test_expected_score_monotone_in_theta() {
        let item = item(23);
        let mut prev = expected_score(&item, -4.0);
        for i in 1..=16 {
            let next = expected_score(&item, -4.0 + 0.5 * i as f64);
            assert!(next >= prev - 1e-12);
            prev = next;
        }
    }
}
