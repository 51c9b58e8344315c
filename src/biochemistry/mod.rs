//! Biochemistry module for HEK293 fed-batch culture.
//!
//! - `kinetics`: Monod limitation, ammonia-driven death, glutamine maintenance
//! - `flux_solver`: coupled amino-acid exchange solved as small linear systems
//! - `rate_model`: full right-hand side of the culture balance equations
//! - `integrator`: adaptive Dormand–Prince 5(4) solver
//!
//! Concentrations are in mM, cell densities in cells/L and time in hours.
//! Specific rates are per cell (mmol/cell/h), so yields such as `Y_x_glc`
//! carry units of cells/mmol.

pub mod flux_solver;
pub mod integrator;
pub mod kinetics;
pub mod rate_model;

pub use flux_solver::{FluxSolver, SerineFluxes, TransaminationFluxes};
pub use integrator::{DormandPrince, IntegrationStats, IntegratorConfig, Trajectory};
pub use rate_model::{RateModel, SpecificRates};
