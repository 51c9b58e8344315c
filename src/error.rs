//! Error taxonomy for the scale-up simulator.
//!
//! Every failure aborts the whole run; there is no per-passage recovery.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which coupled amino-acid system a flux solve belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluxGroup {
    /// Aspartate / arginine / proline / glutamate (4×4)
    Transamination,
    /// Serine / cysteine / glycine (3×3)
    Serine,
}

impl fmt::Display for FluxGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxGroup::Transamination => write!(f, "ASP/ARG/PRO/GLU"),
            FluxGroup::Serine => write!(f, "SER/CYS/GLY"),
        }
    }
}

/// Failures inside a single rate-model evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("ammonia concentration {value_mM:e} mM is outside the death-rate domain (must be > 0)")]
    AmmoniaDomain { value_mM: f64 },

    #[error("{group} flux matrix is singular or near-singular at mu = {mu:e} 1/h")]
    SingularFluxMatrix { group: FluxGroup, mu: f64 },

    #[error("state vector has {actual} entries, expected {expected}")]
    StateLength { expected: usize, actual: usize },
}

/// Failures reported by the adaptive integrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("invalid time span [{t0_h}, {t1_h}] h")]
    InvalidSpan { t0_h: f64, t1_h: f64 },

    #[error("step size {step_h:e} h fell below the minimum at t = {t_h} h")]
    StepSizeUnderflow { t_h: f64, step_h: f64 },

    #[error("exceeded {max_steps} steps at t = {t_h} h")]
    StepLimitExceeded { t_h: f64, max_steps: usize },

    #[error("state became non-finite at t = {t_h} h")]
    NonFinite { t_h: f64 },

    #[error("rate model failed at t = {t_h} h: {source}")]
    Model {
        t_h: f64,
        #[source]
        source: ModelError,
    },
}

/// Malformed configuration, detected before any integration starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scale-up train has no passages")]
    EmptyTrain,

    #[error("passage {}: volume must be positive and finite, got {value} L", .index + 1)]
    InvalidVolume { index: usize, value: f64 },

    #[error("passage {}: duration must be positive and finite, got {value} h", .index + 1)]
    InvalidDuration { index: usize, value: f64 },

    #[error("inoculum must be positive and finite, got {0} cells")]
    InvalidInoculum(f64),

    #[error("viability fraction must lie in (0, 1], got {0}")]
    InvalidViability(f64),

    #[error("target cell count must be positive and finite, got {0}")]
    InvalidTarget(f64),

    #[error("baseline ammonia must be strictly positive, got {0:e} mM")]
    AmmoniaBaseline(f64),

    #[error("baseline {species} concentration must be non-negative and finite, got {value} mM")]
    InvalidMedium { species: &'static str, value: f64 },

    #[error("invalid kinetic parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid integrator settings: {0}")]
    InvalidSolver(String),

    #[error("kinetic parameters produce an unusable flux system: {0}")]
    FluxSystem(#[source] ModelError),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level failure of a scale-up run
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("passage {}: {source}", .passage + 1)]
    Passage {
        /// Zero-based position in the train; messages number passages from 1
        passage: usize,
        #[source]
        source: IntegrationError,
    },

    #[error("passage {}: {species} reached {value_mM:e} mM at t = {t_h} h", .passage + 1)]
    NegativeConcentration {
        passage: usize,
        species: &'static str,
        value_mM: f64,
        t_h: f64,
    },
}
