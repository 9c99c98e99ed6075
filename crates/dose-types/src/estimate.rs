// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Estimate and History Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::domain::TraitDomain;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_finite: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_finite: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Why a trait stopped receiving items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingReason {
    /// Posterior SE dropped below the configured threshold.
    SeThreshold,
    /// The per-trait item cap was reached.
    MaxItems,
    /// The session failed mid-update for this trait.
    Failed,
}

/// Point estimate and precision for one trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitEstimate {
    pub trait_domain: TraitDomain,
    /// EAP posterior mean.
    pub theta: f64,
    /// Posterior standard deviation.
    pub se: f64,
    /// Items administered for this trait so far.
    pub items_administered: usize,
    /// Monotone: once true, stays true.
    pub done: bool,
    /// Set when `done` flips; `None` while the trait is still active.
    pub stopping_reason: Option<StoppingReason>,
    /// Σ Fisher information over used items at the current EAP.
    pub total_information: f64,
}

/// One administered item, recorded in true temporal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub item_number: u8,
    pub trait_domain: TraitDomain,
    /// Raw 1..7 response as observed, before any reverse mapping.
    pub response: u8,
    pub theta_before: f64,
    pub theta_after: f64,
    pub se_before: f64,
    pub se_after: f64,
    /// Fisher information of the item at the pre-update EAP.
    pub fisher_information: f64,
    /// 1-based position in the session.
    pub presentation_order: usize,
}

/// Read-only view of a session: estimates plus full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub estimates: Vec<TraitEstimate>,
    pub history: Vec<HistoryRecord>,
    pub total_items: usize,
    pub complete: bool,
    pub failed: bool,
}

impl SessionSnapshot {
    /// Estimate for one trait (snapshots always carry all six).
    pub fn estimate(&self, domain: TraitDomain) -> Option<&TraitEstimate> {
        self.estimates.iter().find(|e| e.trait_domain == domain)
    }

    /// Share of the full 24-item inventory that was skipped.
    pub fn item_reduction_rate(&self) -> f64 {
        1.0 - self.total_items as f64 / 24.0
    }
}
