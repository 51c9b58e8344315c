//! State of the culture inside one vessel.
//!
//! Named-field record of cell densities and metabolite concentrations,
//! converted to a flat vector only at the integrator boundary.

mod culture;

pub use culture::{CultureState, FIRST_METABOLITE, SPECIES_NAMES, STATE_LEN};
