// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable surface of the DOSE kernel.
//!
//! The backend keeps routing, persistence, and item text; the kernel
//! owns the numerics. `SessionManager` holds the live sessions behind a
//! `parking_lot::Mutex` keyed by monotonically increasing ids — the one
//! piece of shared mutable state, owned entirely by this layer.
//!
//! Payloads cross the boundary as JSON strings (`json.loads` on the
//! Python side); configuration is validated before it is stored.
//!
//! Usage from Python:
//! ```python
//! from dose_kernel import DoseConfig, SessionManager
//!
//! manager = SessionManager(DoseConfig(se_threshold=0.65))
//! first = json.loads(manager.start_session("p-001"))
//! step = json.loads(manager.respond(first["session_id"], 4))
//! ```

use std::collections::HashMap;

use std::sync::Arc;

use parking_lot::Mutex;
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use dose_bank::ItemBank;
use dose_core::{run_simulation, SessionController};
use dose_scoring::{compare_scores, final_results};
use dose_types::{DoseConfig, DoseError, TraitDomain};

fn to_py_err(err: DoseError) -> PyErr {
    match err {
        DoseError::UnknownSession(id) => PyKeyError::new_err(format!("unknown session {id}")),
        DoseError::InvalidResponse { .. }
        | DoseError::ProtocolViolation(_)
        | DoseError::Config(_)
        | DoseError::InvalidItem(_) => PyValueError::new_err(err.to_string()),
        DoseError::DegeneratePosterior(_) | DoseError::NoItemsAvailable { .. } => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyRuntimeError::new_err(format!("serialization error: {e}")))
}

// ─── DoseConfig ─────────────────────────────────────────────────────

/// Python-visible session configuration.
#[pyclass(name = "DoseConfig")]
#[derive(Clone)]
struct PyDoseConfig {
    inner: DoseConfig,
}

#[pymethods]
impl PyDoseConfig {
    #[new]
    #[pyo3(signature = (
        se_threshold = 0.3,
        max_items_per_trait = 4,
        theta_min = -4.0,
        theta_max = 4.0,
        theta_points = 161,
    ))]
    fn new(
        se_threshold: f64,
        max_items_per_trait: usize,
        theta_min: f64,
        theta_max: f64,
        theta_points: usize,
    ) -> PyResult<Self> {
        let config = DoseConfig {
            se_threshold,
            max_items_per_trait,
            theta_min,
            theta_max,
            theta_points,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Deployment preset (SE threshold 0.65).
    #[staticmethod]
    fn deployed() -> Self {
        Self {
            inner: DoseConfig::deployed(),
        }
    }

    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = DoseConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn to_json(&self) -> PyResult<String> {
        to_json(&self.inner)
    }

    #[getter]
    fn se_threshold(&self) -> f64 {
        self.inner.se_threshold
    }

    #[getter]
    fn max_items_per_trait(&self) -> usize {
        self.inner.max_items_per_trait
    }

    fn __repr__(&self) -> String {
        format!(
            "DoseConfig(se_threshold={}, max_items_per_trait={}, grid=[{}, {}]x{})",
            self.inner.se_threshold,
            self.inner.max_items_per_trait,
            self.inner.theta_min,
            self.inner.theta_max,
            self.inner.theta_points,
        )
    }
}

// ─── SessionManager ─────────────────────────────────────────────────

struct LiveSession {
    participant_id: String,
    controller: SessionController,
}

/// Registry of live adaptive sessions.
#[pyclass(name = "SessionManager")]
struct PySessionManager {
    bank: Arc<ItemBank>,
    config: DoseConfig,
    sessions: Mutex<HashMap<u64, LiveSession>>,
    next_id: Mutex<u64>,
}

impl PySessionManager {
    fn with_session<T>(
        &self,
        session_id: u64,
        f: impl FnOnce(&mut LiveSession) -> PyResult<T>,
    ) -> PyResult<T> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| to_py_err(DoseError::UnknownSession(session_id)))?;
        f(session)
    }
}

#[pymethods]
impl PySessionManager {
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PyDoseConfig>) -> PyResult<Self> {
        let config = config.map(|c| c.inner).unwrap_or_default();
        config.validate().map_err(to_py_err)?;
        Ok(Self {
            bank: Arc::new(ItemBank::builtin()),
            config,
            sessions: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        })
    }

    /// Start an adaptive session; returns the first presented item and
    /// initial estimates as JSON.
    fn start_session(&self, participant_id: &str) -> PyResult<String> {
        let mut controller =
            SessionController::new(Arc::clone(&self.bank), self.config.clone())
                .map_err(to_py_err)?;
        let outcome = controller.start().map_err(to_py_err)?;

        let session_id = {
            let mut next = self.next_id.lock();
            let id = *next;
            *next += 1;
            id
        };
        let payload = serde_json::json!({
            "session_id": session_id,
            "participant_id": participant_id,
            "result": outcome,
        });
        self.sessions.lock().insert(
            session_id,
            LiveSession {
                participant_id: participant_id.to_string(),
                controller,
            },
        );
        Ok(payload.to_string())
    }

    /// Feed one observed 1..7 response; returns the next action as JSON.
    fn respond(&self, session_id: u64, raw_response: i64) -> PyResult<String> {
        // Range-check here so out-of-band Python ints surface as the
        // kernel's InvalidResponse, not an extraction overflow.
        if !(1..=7).contains(&raw_response) {
            return Err(to_py_err(DoseError::InvalidResponse {
                response: raw_response,
            }));
        }
        self.with_session(session_id, |session| {
            let outcome = session
                .controller
                .respond(raw_response as u8)
                .map_err(to_py_err)?;
            to_json(&outcome)
        })
    }

    /// Read-only estimates + history. Idempotent.
    fn snapshot(&self, session_id: u64) -> PyResult<String> {
        self.with_session(session_id, |session| {
            let payload = serde_json::json!({
                "session_id": session_id,
                "participant_id": session.participant_id,
                "snapshot": session.controller.snapshot(),
            });
            Ok(payload.to_string())
        })
    }

    /// Scored results (θ, SE, likert projection) for the comparison layer.
    fn final_results(&self, session_id: u64) -> PyResult<String> {
        self.with_session(session_id, |session| {
            to_json(&final_results(&session.controller.snapshot()))
        })
    }

    /// Drop a finished or abandoned session. Returns whether it existed.
    fn remove_session(&self, session_id: u64) -> bool {
        self.sessions.lock().remove(&session_id).is_some()
    }

    fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

// ─── Module functions ───────────────────────────────────────────────

/// Agreement statistics between two `{trait: score}` JSON maps.
#[pyfunction]
fn compare_score_maps(first: &str, second: &str) -> PyResult<String> {
    let parse = |json: &str| -> PyResult<std::collections::BTreeMap<TraitDomain, f64>> {
        serde_json::from_str(json)
            .map_err(|e| PyValueError::new_err(format!("bad score map: {e}")))
    };
    to_json(&compare_scores(&parse(first)?, &parse(second)?))
}

/// Deterministic Monte Carlo validation run; returns the report as JSON.
#[pyfunction]
#[pyo3(signature = (respondents, seed, config = None))]
fn simulate(respondents: usize, seed: u64, config: Option<PyDoseConfig>) -> PyResult<String> {
    let config = config.map(|c| c.inner).unwrap_or_else(DoseConfig::deployed);
    let bank = Arc::new(ItemBank::builtin());
    let report = run_simulation(&bank, &config, respondents, seed).map_err(to_py_err)?;
    to_json(&report)
}

#[pymodule]
fn dose_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDoseConfig>()?;
    m.add_class::<PySessionManager>()?;
    m.add_function(wrap_pyfunction!(compare_score_maps, m)?)?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    Ok(())
}
