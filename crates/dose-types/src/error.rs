// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all DOSE Kernel failures.
#[derive(Error, Debug)]
pub enum DoseError {
    /// Malformed item-bank entry (bad alpha, non-finite beta, unknown
    /// trait, broken trait partition). Fatal at startup.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Posterior renormalizer underflowed to zero. Bug signal; the
    /// session transitions to `failed` and keeps its history.
    #[error("degenerate posterior: {0}")]
    DegeneratePosterior(String),

    /// Selector invoked on a trait with no remaining items. Indicates a
    /// controller bug; fatal for the session.
    #[error("no items available for trait {trait_code}")]
    NoItemsAvailable { trait_code: &'static str },

    /// `respond` called in the wrong state. Recoverable: state unchanged.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Raw response outside 1..7. Recoverable: state unchanged.
    #[error("invalid response: {response} (expected 1..=7)")]
    InvalidResponse { response: i64 },

    /// Session id not known to the interface layer.
    #[error("unknown session: {0}")]
    UnknownSession(u64),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

pub type DoseResult<T> = Result<T, DoseError>;
