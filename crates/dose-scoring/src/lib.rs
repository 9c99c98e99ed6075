// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Scoring Adapter
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Scoring adapter for completed adaptive sessions: projects latent
//! estimates onto the 1–7 Likert scale and computes agreement
//! statistics against fixed-form survey scores.
//!
//! The projection constant is part of the measurement contract —
//! changing it would silently invalidate every stored comparison
//! against the classically scored survey.

pub mod compare;
pub mod likert;

pub use compare::{compare_scores, ScoreComparison};
pub use likert::{final_results, theta_to_likert, FinalResults, TraitScore};
