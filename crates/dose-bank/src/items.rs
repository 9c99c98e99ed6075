// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Canonical Item Parameters
// ─────────────────────────────────────────────────────────────────────
//! Canonical Mini-IPIP6 GRM parameters.
//!
//! Data source: Sibley (2012), "The Mini-IPIP6: Item Response Theory
//! analysis of a short measure of the big-six factors of personality in
//! New Zealand", Table 2. Item text stays outside the kernel; the bank
//! carries numbers, traits, reverse flags, and parameters only.

use dose_types::TraitDomain;

/// One Mini-IPIP6 item: GRM parameters plus scoring metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    /// Identifier in 1..=24.
    pub number: u8,
    pub domain: TraitDomain,
    /// Reverse-keyed: an observed response r scores as 8 − r.
    pub reverse: bool,
    /// Discrimination α (positive).
    pub alpha: f64,
    /// Ordered thresholds β₁ ≤ … ≤ β₆ for the 7-point scale.
    pub beta: [f64; 6],
}

pub const ITEM_COUNT: usize = 24;
pub const ITEMS_PER_TRAIT: usize = 4;

use dose_types::TraitDomain::{
    Agreeableness as A, Conscientiousness as C, Extraversion as E,
    HonestyHumility as H, Neuroticism as N, Openness as O,
};

/// The full inventory in item-number order.
pub const ITEMS: [Item; ITEM_COUNT] = [
    // ── Extraversion: 1, 7, 19, 23 ──────────────────────────────────
    Item { number: 1,  domain: E, reverse: false, alpha: 1.07, beta: [-1.85, -1.04, -0.21,  0.89,  1.98, 2.76] },
    Item { number: 7,  domain: E, reverse: true,  alpha: 0.84, beta: [-2.82, -1.67, -0.80,  0.10,  0.86, 1.91] },
    Item { number: 19, domain: E, reverse: true,  alpha: 1.00, beta: [-2.51, -1.32, -0.49,  0.45,  1.23, 2.44] },
    Item { number: 23, domain: E, reverse: false, alpha: 0.92, beta: [-2.25, -1.27, -0.54,  0.24,  0.97, 1.96] },
    // ── Agreeableness: 2, 8, 14, 20 ─────────────────────────────────
    Item { number: 2,  domain: A, reverse: false, alpha: 1.46, beta: [-3.19, -2.51, -1.86, -1.19, -0.28, 0.99] },
    Item { number: 8,  domain: A, reverse: true,  alpha: 0.66, beta: [-3.74, -2.51, -1.59, -0.76,  0.22, 1.76] },
    Item { number: 14, domain: A, reverse: false, alpha: 1.12, beta: [-3.15, -2.36, -1.70, -0.92,  0.03, 1.37] },
    Item { number: 20, domain: A, reverse: true,  alpha: 0.81, beta: [-3.77, -2.69, -1.94, -1.19, -0.28, 1.25] },
    // ── Conscientiousness: 3, 10, 11, 22 ────────────────────────────
    Item { number: 3,  domain: C, reverse: false, alpha: 0.90, beta: [-3.39, -2.13, -1.18, -0.27,  0.57, 1.64] },
    Item { number: 10, domain: C, reverse: false, alpha: 0.85, beta: [-3.49, -2.72, -2.02, -1.06, -0.20, 1.12] },
    Item { number: 11, domain: C, reverse: true,  alpha: 0.77, beta: [-4.21, -2.93, -2.05, -1.07, -0.18, 1.38] },
    Item { number: 22, domain: C, reverse: true,  alpha: 0.94, beta: [-2.63, -1.73, -1.17, -0.64, -0.09, 1.11] },
    // ── Neuroticism: 4, 15, 16, 17 ──────────────────────────────────
    Item { number: 4,  domain: N, reverse: false, alpha: 1.13, beta: [-1.32, -0.23,  0.36,  1.04,  1.72, 2.53] },
    Item { number: 15, domain: N, reverse: true,  alpha: 0.77, beta: [-2.24, -0.70,  0.38,  1.48,  2.57, 3.92] },
    Item { number: 16, domain: N, reverse: false, alpha: 0.90, beta: [-2.15, -0.76,  0.05,  0.89,  1.72, 2.80] },
    Item { number: 17, domain: N, reverse: true,  alpha: 0.65, beta: [-2.82, -1.01, -0.19,  0.76,  1.80, 3.15] },
    // ── Openness: 5, 9, 13, 21 ──────────────────────────────────────
    Item { number: 5,  domain: O, reverse: false, alpha: 0.54, beta: [-4.22, -2.68, -1.52, -0.21,  0.94, 2.47] },
    Item { number: 9,  domain: O, reverse: true,  alpha: 1.10, beta: [-2.70, -1.72, -1.00, -0.17,  0.47, 1.61] },
    Item { number: 13, domain: O, reverse: true,  alpha: 0.79, beta: [-3.45, -2.35, -1.56, -0.85, -0.11, 1.13] },
    Item { number: 21, domain: O, reverse: true,  alpha: 1.24, beta: [-2.57, -1.71, -1.12, -0.29,  0.41, 1.43] },
    // ── Honesty-Humility: 6, 12, 18, 24 ─────────────────────────────
    Item { number: 6,  domain: H, reverse: true,  alpha: 0.91, beta: [-3.43, -2.67, -1.89, -1.10, -0.42, 0.71] },
    Item { number: 12, domain: H, reverse: true,  alpha: 1.17, beta: [-2.32, -1.69, -1.08, -0.33,  0.17, 0.99] },
    Item { number: 18, domain: H, reverse: true,  alpha: 1.47, beta: [-1.92, -1.42, -0.97, -0.52, -0.16, 0.48] },
    Item { number: 24, domain: H, reverse: true,  alpha: 1.16, beta: [-2.08, -1.30, -0.71, -0.12,  0.31, 1.10] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_count() {
        assert_eq!(ITEMS.len(), ITEM_COUNT);
    }

    #[test]
    fn test_numbers_unique_and_in_range() {
        let mut seen = [false; ITEM_COUNT + 1];
        for item in &ITEMS {
            assert!((1..=24).contains(&item.number));
            assert!(!seen[item.number as usize], "duplicate item {}", item.number);
            seen[item.number as usize] = true;
        }
    }

    #[test]
    fn test_alphas_positive() {
        assert!(ITEMS.iter().all(|i| i.alpha > 0.0));
    }

    #[test]
    fn test_betas_ordered() {
        for item in &ITEMS {
            for w in item.beta.windows(2) {
                assert!(
                    w[0] <= w[1],
                    "item {}: thresholds out of order",
                    item.number
                );
            }
        }
    }

    #[test]
    fn test_four_items_per_trait() {
        for domain in TraitDomain::ALL {
            let count = ITEMS.iter().filter(|i| i.domain == domain).count();
            assert_eq!(count, ITEMS_PER_TRAIT, "{}", domain.name());
        }
    }

    #[test]
    fn test_reverse_keyed_set() {
        let reversed: Vec<u8> = ITEMS
            .iter()
            .filter(|i| i.reverse)
            .map(|i| i.number)
            .collect();
        assert_eq!(
            reversed,
            // In bank order, grouped by trait.
            vec![7, 19, 8, 20, 11, 22, 15, 17, 9, 13, 21, 6, 12, 18, 24]
        );
        assert_eq!(reversed.len(), 15);
    }
}
