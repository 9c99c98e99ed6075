// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! DOSE Kernel — the adaptive measurement engine behind the
//! Mini-IPIP6 personality assessment.

pub mod config;
pub mod domain;
pub mod error;
pub mod estimate;

pub use config::DoseConfig;
pub use domain::TraitDomain;
pub use error::{DoseError, DoseResult};
pub use estimate::{
    HistoryRecord, SessionSnapshot, StoppingReason, TraitEstimate,
};
