// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Trait Estimator
// ─────────────────────────────────────────────────────────────────────
//! One estimator per trait: a posterior engine plus bookkeeping
//! (items consumed, monotone `done` flag, stopping reason).
//!
//! This is the reverse-scoring boundary: `record` maps an observed
//! response r to the GRM category 8−r for reverse-keyed items, exactly
//! once. Everything below (kernel, posterior) sees canonical
//! categories; everything above (controller, history, scoring) sees raw
//! responses.

use std::sync::Arc;

use dose_bank::{Item, ItemBank};
use dose_types::{
    DoseConfig, DoseError, DoseResult, StoppingReason, TraitDomain, TraitEstimate,
};

use crate::grm;
use crate::posterior::{PosteriorEngine, ThetaGrid};

#[derive(Debug, Clone)]
pub struct TraitEstimator {
    domain: TraitDomain,
    engine: PosteriorEngine,
    items_used: Vec<u8>,
    done: bool,
    stopping_reason: Option<StoppingReason>,
    se_threshold: f64,
    max_items: usize,
}

impl TraitEstimator {
    pub fn new(domain: TraitDomain, grid: Arc<ThetaGrid>, config: &DoseConfig) -> Self {
        Self {
            domain,
            engine: PosteriorEngine::new(grid),
            items_used: Vec::with_capacity(config.max_items_per_trait),
            done: false,
            stopping_reason: None,
            se_threshold: config.se_threshold,
            max_items: config.max_items_per_trait,
        }
    }

    pub fn domain(&self) -> TraitDomain {
        self.domain
    }

    /// Current EAP estimate.
    pub fn theta(&self) -> f64 {
        self.engine.eap()
    }

    /// Current posterior SE.
    pub fn se(&self) -> f64 {
        self.engine.sd()
    }

    pub fn items_used(&self) -> &[u8] {
        &self.items_used
    }

    pub fn items_count(&self) -> usize {
        self.items_used.len()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn stopping_reason(&self) -> Option<StoppingReason> {
        self.stopping_reason
    }

    /// Quadrature mass of the posterior (diagnostic; 1 within tolerance).
    pub fn posterior_mass(&self) -> f64 {
        self.engine.mass()
    }

    /// The trait's bank items not yet administered, in bank order.
    pub fn available_items(&self, bank: &ItemBank) -> Vec<u8> {
        bank.trait_items(self.domain)
            .iter()
            .copied()
            .filter(|n| !self.items_used.contains(n))
            .collect()
    }

    /// Record an observed response and fold it into the posterior.
    ///
    /// Recoverable faults (`InvalidResponse`, duplicate or foreign item,
    /// cap exceeded) leave the estimator untouched; a posterior fault
    /// propagates after the engine has already refused the update.
    pub fn record(&mut self, item: &Item, raw_response: u8) -> DoseResult<()> {
        if !(1..=7).contains(&raw_response) {
            return Err(DoseError::InvalidResponse {
                response: raw_response as i64,
            });
        }
        if item.domain != self.domain {
            return Err(DoseError::ProtocolViolation(format!(
                "item {} belongs to trait {}, not {}",
                item.number,
                item.domain.code(),
                self.domain.code()
            )));
        }
        if self.items_used.contains(&item.number) {
            return Err(DoseError::ProtocolViolation(format!(
                "item {} already administered for trait {}",
                item.number,
                self.domain.code()
            )));
        }
        if self.items_used.len() >= self.max_items {
            return Err(DoseError::ProtocolViolation(format!(
                "trait {} already at its {}-item cap",
                self.domain.code(),
                self.max_items
            )));
        }

        // The one and only reverse-scoring application.
        let category = if item.reverse {
            8 - raw_response
        } else {
            raw_response
        };
        self.engine.update(item, category)?;

        self.items_used.push(item.number);
        if !self.done {
            if self.engine.sd() < self.se_threshold {
                self.done = true;
                self.stopping_reason = Some(StoppingReason::SeThreshold);
            } else if self.items_used.len() >= self.max_items {
                self.done = true;
                self.stopping_reason = Some(StoppingReason::MaxItems);
            }
        }
        Ok(())
    }

    /// Freeze the trait after a fatal session fault.
    pub fn mark_failed(&mut self) {
        if !self.done {
            self.done = true;
            self.stopping_reason = Some(StoppingReason::Failed);
        }
    }

    /// Σ Fisher information over used items at the current EAP.
    pub fn total_information(&self, bank: &ItemBank) -> f64 {
        let theta = self.engine.eap();
        self.items_used
            .iter()
            .filter_map(|n| bank.item(*n))
            .map(|item| grm::fisher_information(item, theta).unwrap_or(0.0))
            .sum()
    }

    /// Snapshot of the trait's current state.
    pub fn estimate(&self, bank: &ItemBank) -> TraitEstimate {
        TraitEstimate {
            trait_domain: self.domain,
            theta: self.engine.eap(),
            se: self.engine.sd(),
            items_administered: self.items_used.len(),
            done: self.done,
            stopping_reason: self.stopping_reason,
            total_information: self.total_information(bank),
        }
    }
}
