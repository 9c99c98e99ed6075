// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Maximum-Information Item Selector
// ─────────────────────────────────────────────────────────────────────
//! Next-item choice for one trait: the unused item maximizing Fisher
//! information at the trait's current EAP.
//!
//! Ties within 1e-9 break toward the smallest item number, so the
//! selection is deterministic and testable — in particular, the very
//! first item per trait (θ̂ = 0, nothing used) is fully determined by
//! the bank.

use dose_bank::{Item, ItemBank};
use dose_types::{DoseError, DoseResult};

use crate::estimator::TraitEstimator;
use crate::grm;

/// Fisher-information tie window.
const TIE_EPS: f64 = 1e-9;

/// Pick the next item for the estimator's trait.
///
/// Fails with `NoItemsAvailable` when every item of the trait has been
/// administered; the controller never calls it for a `done` trait.
pub fn select_next_item<'a>(
    bank: &'a ItemBank,
    estimator: &TraitEstimator,
) -> DoseResult<&'a Item> {
    let theta = estimator.theta();
    let mut best: Option<(&Item, f64)> = None;

    for number in estimator.available_items(bank) {
        let item = bank.item(number).ok_or_else(|| {
            DoseError::InvalidItem(format!("item {number} missing from bank"))
        })?;
        let info = grm::fisher_information(item, theta)?;
        best = match best {
            None => Some((item, info)),
            Some((incumbent, best_info)) => {
                if info > best_info + TIE_EPS
                    || ((info - best_info).abs() <= TIE_EPS
                        && item.number < incumbent.number)
                {
                    Some((item, info))
                } else {
                    Some((incumbent, best_info))
                }
            }
        };
    }

    best.map(|(item, _)| item).ok_or(DoseError::NoItemsAvailable {
        trait_code: estimator.domain().code(),
    })
}
