//! Configuration module for loading simulation parameters.
//!
//! Kinetic constants and the process description are immutable once loaded.

mod parameters;
mod process;

pub use parameters::{
    load_json, DeathParameters, GrowthParameters, KineticParameters, MaintenanceParameters,
    MonodConstants, Parameters, YieldCoefficients,
};
pub use process::{
    MediumComposition, NegativityPolicy, PassageDescriptor, ProcessParameters, AMMONIA_FLOOR_MM,
};
