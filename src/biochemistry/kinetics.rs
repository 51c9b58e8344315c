//! Kinetic rate expressions used by the culture rate model.
//!
//! - Monod saturation (nutrient limitation of growth)
//! - Ammonia sigmoid (Hill-type activation of cell death)
//! - Glutamine maintenance demand
//!
//! Reference: Monod J. Annu Rev Microbiol. 1949;3:371-394

use crate::error::ModelError;

/// Monod limitation term
///
/// f = [S] / (K + [S])
///
/// Non-positive concentrations are fully limiting (f = 0), which keeps the
/// term inside [0, 1) when the integrator overshoots depletion.
#[inline]
pub fn monod(s_mM: f64, k_mM: f64) -> f64 {
    if s_mM <= 0.0 {
        return 0.0;
    }
    s_mM / (k_mM + s_mM)
}

/// Specific death rate from ammonia accumulation
///
/// μ_d = μ_d,max / (1 + (K_d,amm / [AMM])^n)
///
/// Rises from 0 toward μ_d,max as ammonia accumulates; n sets the steepness.
/// The expression divides by ammonia, so `amm_mM` must be strictly positive.
#[inline]
pub fn ammonia_death_rate(
    mu_d_max_per_h: f64,
    k_d_amm_mM: f64,
    d_n: f64,
    amm_mM: f64,
) -> Result<f64, ModelError> {
    if !(amm_mM.is_finite() && amm_mM > 0.0) {
        return Err(ModelError::AmmoniaDomain { value_mM: amm_mM });
    }
    Ok(mu_d_max_per_h / (1.0 + (k_d_amm_mM / amm_mM).powf(d_n)))
}

/// Glutamine maintenance demand (mmol/cell/h)
///
/// M_gln = α₁ [GLN] / (α₂ + [GLN])
///
/// Exhausted glutamine (`gln_mM <= 0`) carries no maintenance demand, which
/// keeps the expression away from its pole at [GLN] = -α₂.
#[inline]
pub fn glutamine_maintenance(a1: f64, a2_mM: f64, gln_mM: f64) -> f64 {
    if gln_mM <= 0.0 {
        return 0.0;
    }
    a1 * gln_mM / (a2_mM + gln_mM)
}
