// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Adaptive Measurement Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Sequential Bayesian estimation for the Mini-IPIP6 adaptive
//! assessment (DOSE): after every response the posterior over the
//! latent trait is updated on a fixed grid, and the next item is the
//! unused one with maximum Fisher information at the current EAP,
//! rotated across the six traits until each reaches its precision
//! target or item cap.
//!
//! Architecture:
//!   - grm: Graded Response Model category probabilities + information
//!   - posterior: grid-discretized posterior with log-space updates
//!   - estimator: per-trait posterior + bookkeeping + reverse scoring
//!   - selector: maximum-information item choice with fixed tie-break
//!   - controller: explicit session state machine and stopping logic
//!   - simulate: deterministic Monte Carlo respondent simulation
//!
//! # Numerical Invariants
//!
//! 1. **Category probabilities are strictly positive**: every entry is
//!    floored at 1e-12 and the vector renormalized, so log-likelihoods
//!    are always finite downstream.
//!
//! 2. **The posterior stays a probability density**: after every update
//!    the grid quadrature Σ pᵢ·Δθ equals 1 within 1e-6; an underflowing
//!    renormalizer raises `DegeneratePosterior` instead of degrading.
//!
//! 3. **Reverse scoring is applied exactly once**, at the estimator
//!    boundary (raw 1..7 → 8−r). Kernel, selector, history rows, and
//!    scoring all see canonicalized or raw values as documented — never
//!    a double-reversed one.
//!
//! 4. **`done` is monotone**: a trait that reached its stopping rule
//!    never re-enters the round-robin rotation.

pub mod controller;
pub mod estimator;
pub mod grm;
pub mod posterior;
pub mod selector;
pub mod simulate;

pub use controller::{
    PresentedItem, Progress, SessionController, SessionPhase, StepOutcome,
};
pub use estimator::TraitEstimator;
pub use posterior::{PosteriorEngine, ThetaGrid};
pub use selector::select_next_item;
pub use simulate::{run_simulation, SimpleRng, SimulationReport};
