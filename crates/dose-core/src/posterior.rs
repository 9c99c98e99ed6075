// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Grid Posterior Engine
// ─────────────────────────────────────────────────────────────────────
//! Grid-discretized Bayesian posterior over the latent trait.
//!
//! The posterior lives on a fixed, shared θ grid; quadrature is the
//! rectangle rule with weight Δθ. Updates multiply in the response
//! likelihood in log space (with max-subtraction) and renormalize, so
//! the density never silently degrades — an underflowing renormalizer
//! raises `DegeneratePosterior`.
//!
//! A fixed grid (rather than adaptive quadrature or a closed-form MAP)
//! keeps replays reproducible across implementations: identical grids
//! give bitwise-identical moments.

use std::sync::Arc;

use dose_bank::Item;
use dose_types::{DoseConfig, DoseError, DoseResult};

use crate::grm;

/// Shared latent-trait grid: equally spaced nodes, endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct ThetaGrid {
    nodes: Vec<f64>,
    step: f64,
}

impl ThetaGrid {
    /// Build the grid described by a validated configuration.
    pub fn from_config(config: &DoseConfig) -> Self {
        let step = config.theta_step();
        let nodes = (0..config.theta_points)
            .map(|i| config.theta_min + step * i as f64)
            .collect();
        Self { nodes, step }
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Discretized posterior with cached EAP mean and standard deviation.
#[derive(Debug, Clone)]
pub struct PosteriorEngine {
    grid: Arc<ThetaGrid>,
    /// Density values; Σ density·Δθ = 1 within tolerance.
    density: Vec<f64>,
    /// Scratch for the log-space update (pre-allocated).
    scratch: Vec<f64>,
    theta: f64,
    se: f64,
}

impl PosteriorEngine {
    /// Start from the standard-normal prior renormalized on the grid.
    pub fn new(grid: Arc<ThetaGrid>) -> Self {
        let n = grid.len();
        let mut engine = Self {
            grid,
            density: vec![0.0; n],
            scratch: vec![0.0; n],
            theta: 0.0,
            se: 1.0,
        };
        engine.init();
        engine
    }

    /// Reset to the N(0,1) prior.
    pub fn init(&mut self) {
        let norm = 1.0 / (2.0 * std::f64::consts::PI).sqrt();
        for (d, &theta) in self.density.iter_mut().zip(self.grid.nodes()) {
            *d = norm * (-0.5 * theta * theta).exp();
        }
        let mass: f64 = self.density.iter().sum::<f64>() * self.grid.step();
        for d in self.density.iter_mut() {
            *d /= mass;
        }
        self.recompute_moments();
    }

    /// Multiply in the likelihood of one canonicalized response.
    ///
    /// `category` must already be reverse-mapped; the engine consults
    /// the kernel directly and never sees raw observed responses.
    pub fn update(&mut self, item: &Item, category: u8) -> DoseResult<()> {
        debug_assert!((1..=7).contains(&category));
        let idx = (category - 1) as usize;

        // Log posterior = log prior-so-far + log likelihood, node-wise.
        let mut max_log = f64::NEG_INFINITY;
        for (i, &theta) in self.grid.nodes().iter().enumerate() {
            let like = grm::category_probs(item, theta)[idx];
            let log_post = self.density[i].ln() + like.ln();
            self.scratch[i] = log_post;
            if log_post > max_log {
                max_log = log_post;
            }
        }

        // Max-subtraction before exponentiating, then renormalize.
        let mut sum = 0.0;
        for v in self.scratch.iter_mut() {
            *v = (*v - max_log).exp();
            sum += *v;
        }
        let mass = sum * self.grid.step();
        if !(mass.is_finite() && mass > 0.0) {
            return Err(DoseError::DegeneratePosterior(format!(
                "renormalizer underflowed updating item {} category {category}",
                item.number
            )));
        }
        for (d, &v) in self.density.iter_mut().zip(self.scratch.iter()) {
            *d = v / mass;
        }

        self.recompute_moments();
        Ok(())
    }

    fn recompute_moments(&mut self) {
        let step = self.grid.step();
        let mut mean = 0.0;
        for (&theta, &d) in self.grid.nodes().iter().zip(&self.density) {
            mean += theta * d * step;
        }
        let mut var = 0.0;
        for (&theta, &d) in self.grid.nodes().iter().zip(&self.density) {
            let dev = theta - mean;
            var += dev * dev * d * step;
        }
        self.theta = mean;
        self.se = var.max(1e-10).sqrt();
    }

    /// EAP point estimate (posterior mean).
    pub fn eap(&self) -> f64 {
        self.theta
    }

    /// Posterior standard deviation.
    pub fn sd(&self) -> f64 {
        self.se
    }

    /// Quadrature mass Σ density·Δθ; 1 within tolerance by construction.
    pub fn mass(&self) -> f64 {
        self.density.iter().sum::<f64>() * self.grid.step()
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn grid(&self) -> &ThetaGrid {
        &self.grid
    }
}
