// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Likert Projection
// ─────────────────────────────────────────────────────────────────────
//! Linear projection of latent estimates onto the survey's 1–7 scale:
//!
//!   likert = clip(4 + 0.75·θ̂, 1, 7)
//!
//! A documented convention, not an IRT identity — pinned exactly so
//! adaptive and fixed-form scores stay comparable across versions.

use serde::{Deserialize, Serialize};

use dose_types::estimate::clamp_finite;
use dose_types::{SessionSnapshot, StoppingReason, TraitDomain};

/// Scale midpoint: θ = 0 maps to the neutral response.
pub const LIKERT_MIDPOINT: f64 = 4.0;
/// Scale units per latent standard deviation.
pub const LIKERT_SLOPE: f64 = 0.75;

/// Project a latent estimate onto the 1–7 scale.
pub fn theta_to_likert(theta: f64) -> f64 {
    clamp_finite(LIKERT_MIDPOINT + LIKERT_SLOPE * theta, 1.0, 7.0)
}

/// Final per-trait result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitScore {
    pub trait_domain: TraitDomain,
    pub theta: f64,
    pub se: f64,
    pub likert: f64,
    pub items_administered: usize,
    pub stopping_reason: Option<StoppingReason>,
    pub total_information: f64,
}

/// Harvested results of a finished (or failed) session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResults {
    pub trait_scores: Vec<TraitScore>,
    pub total_items: usize,
    pub item_reduction_rate: f64,
    pub complete: bool,
    pub failed: bool,
}

impl FinalResults {
    pub fn score(&self, domain: TraitDomain) -> Option<&TraitScore> {
        self.trait_scores.iter().find(|s| s.trait_domain == domain)
    }

    /// Per-trait likert map, ready for [`crate::compare_scores`].
    pub fn likert_map(&self) -> std::collections::BTreeMap<TraitDomain, f64> {
        self.trait_scores
            .iter()
            .map(|s| (s.trait_domain, s.likert))
            .collect()
    }
}

/// Convert a session snapshot into final scored results.
pub fn final_results(snapshot: &SessionSnapshot) -> FinalResults {
    FinalResults {
        trait_scores: snapshot
            .estimates
            .iter()
            .map(|e| TraitScore {
                trait_domain: e.trait_domain,
                theta: e.theta,
                se: e.se,
                likert: theta_to_likert(e.theta),
                items_administered: e.items_administered,
                stopping_reason: e.stopping_reason,
                total_information: e.total_information,
            })
            .collect(),
        total_items: snapshot.total_items,
        item_reduction_rate: snapshot.item_reduction_rate(),
        complete: snapshot.complete,
        failed: snapshot.failed,
    }
}
