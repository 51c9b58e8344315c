//! Cell Passage Sim - fed-batch HEK293 scale-up simulator
//!
//! Grows a cell inoculum through a train of progressively larger vessels.
//! Each passage integrates a metabolic rate model (growth, ammonia-driven
//! death, glucose/glutamine and amino-acid exchange) and hands its harvest to
//! the next vessel.

// Allow non-snake-case for unit suffixes and yield names (mM, volume_L, Y_x_glc, etc.)
#![allow(non_snake_case)]

pub mod biochemistry;
pub mod config;
pub mod error;
pub mod export;
pub mod scaleup;
pub mod state;

pub use biochemistry::{DormandPrince, FluxSolver, IntegratorConfig, RateModel, SpecificRates};
pub use config::{KineticParameters, Parameters, ProcessParameters};
pub use error::{ConfigError, IntegrationError, ModelError, SimulationError};
pub use scaleup::{PassageDriver, PassageRecord, ScaleUpReport};
pub use state::CultureState;
