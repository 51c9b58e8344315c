//! Culture rate model: growth, death and metabolite exchange of HEK293 cells.
//!
//! Maps the culture state to its time derivative. Growth is co-limited
//! multiplicatively by glucose, glutamine and ten amino acids; death is driven
//! by ammonia. Metabolite exchange rates are per-cell specific rates (Q_*)
//! scaled by the viable density.
//!
//! The dead-cell balance is `dXd/dt = μ_d·Xv`. The lysis constant in
//! `DeathParameters` is not applied; whether dead cells should clear at
//! `K_lysis` is an open modelling question.

use crate::config::KineticParameters;
use crate::error::{ConfigError, ModelError};
use crate::state::{CultureState, STATE_LEN};

use super::flux_solver::{FluxSolver, SerineFluxes, TransaminationFluxes};
use super::kinetics::{ammonia_death_rate, glutamine_maintenance, monod};

/// Specific rates at one state (per cell, per hour)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecificRates {
    /// Specific growth rate μ (1/h)
    pub mu_per_h: f64,
    /// Specific death rate μ_d (1/h)
    pub mu_d_per_h: f64,
    pub q_glc: f64,
    pub q_gln: f64,
    pub q_amm: f64,
    pub q_ala: f64,
    pub q_asn: f64,
    pub q_his: f64,
    pub q_ile: f64,
    pub q_leu: f64,
    pub q_lys: f64,
    pub q_met: f64,
    pub q_phe: f64,
    pub q_thr: f64,
    pub q_tyr: f64,
    pub q_val: f64,
    pub q_lac: f64,
    pub transamination: TransaminationFluxes,
    pub serine: SerineFluxes,
}

/// Right-hand side of the culture ODE system.
///
/// Immutable after construction; safe to share across threads for
/// independent what-if runs.
#[derive(Debug, Clone)]
pub struct RateModel {
    params: KineticParameters,
    flux_solver: FluxSolver,
}

impl RateModel {
    /// Build a model, rejecting parameter sets with undefined rate laws
    pub fn new(params: KineticParameters) -> Result<Self, ConfigError> {
        params.validate()?;
        let flux_solver = FluxSolver::new(&params.yields);
        flux_solver
            .validate(&params.growth)
            .map_err(ConfigError::FluxSystem)?;
        Ok(Self { params, flux_solver })
    }

    pub fn params(&self) -> &KineticParameters {
        &self.params
    }

    pub fn flux_solver(&self) -> &FluxSolver {
        &self.flux_solver
    }

    /// Specific growth rate μ (1/h), always within [mu_min, mu_max]
    pub fn growth_rate(&self, s: &CultureState) -> f64 {
        let g = &self.params.growth;
        let k = &g.monod;
        let limitation = monod(s.glucose_mM, k.K_glc_mM)
            * monod(s.glutamine_mM, k.K_gln_mM)
            * monod(s.aspartate_mM, k.K_asp_mM)
            * monod(s.arginine_mM, k.K_arg_mM)
            * monod(s.valine_mM, k.K_val_mM)
            * monod(s.lysine_mM, k.K_lys_mM)
            * monod(s.threonine_mM, k.K_thr_mM)
            * monod(s.histidine_mM, k.K_his_mM)
            * monod(s.serine_mM, k.K_ser_mM)
            * monod(s.isoleucine_mM, k.K_ile_mM)
            * monod(s.phenylalanine_mM, k.K_phe_mM)
            * monod(s.leucine_mM, k.K_leu_mM);
        g.mu_min_per_h + (g.mu_max_per_h - g.mu_min_per_h) * limitation
    }

    /// Specific death rate μ_d (1/h)
    pub fn death_rate(&self, ammonia_mM: f64) -> Result<f64, ModelError> {
        let d = &self.params.death;
        ammonia_death_rate(d.mu_d_max_per_h, d.K_d_amm_mM, d.d_n, ammonia_mM)
    }

    /// All specific rates at state `s`
    pub fn specific_rates(&self, s: &CultureState) -> Result<SpecificRates, ModelError> {
        let y = &self.params.yields;
        let m = &self.params.maintenance;

        let mu = self.growth_rate(s);
        let mu_d = self.death_rate(s.ammonia_mM)?;

        // Determined directly by growth
        let q_his = -mu / y.Y_x_his;
        let q_ala = -mu / y.Y_x_ala + y.Y_ala_x;
        let q_ile = -mu / y.Y_x_ile;
        let q_leu = -mu / y.Y_x_leu;
        let q_lys = -mu / y.Y_x_lys + y.Y_lys_x;
        let q_met = -mu / y.Y_x_met;
        let q_phe = -mu / y.Y_x_phe;
        let q_thr = -mu / y.Y_x_thr;
        let q_tyr = -mu / y.Y_x_tyr - y.Y_tyr_phe * q_phe;
        let q_val = -mu / y.Y_x_val;

        let transamination = self.flux_solver.transamination(mu, q_his)?;
        let serine = self.flux_solver.serine(mu)?;

        let m_gln = glutamine_maintenance(m.a1, m.a2_mM, s.glutamine_mM);
        let q_gln = -mu / y.Y_x_gln - m_gln + y.Y_gln_glu * transamination.glutamate;
        let q_glc = -mu / y.Y_x_glc - m.M_glc;
        let q_amm = -y.Y_amm_gln * q_gln;
        let q_asn = -y.Y_asn_asp * transamination.aspartate;
        let q_lac = -y.Y_lac_glc * q_glc;

        Ok(SpecificRates {
            mu_per_h: mu,
            mu_d_per_h: mu_d,
            q_glc,
            q_gln,
            q_amm,
            q_ala,
            q_asn,
            q_his,
            q_ile,
            q_leu,
            q_lys,
            q_met,
            q_phe,
            q_thr,
            q_tyr,
            q_val,
            q_lac,
            transamination,
            serine,
        })
    }

    /// Time derivative of the culture state.
    ///
    /// `_t_h` is accepted for the integrator signature; the model is
    /// autonomous.
    pub fn derivatives(&self, _t_h: f64, s: &CultureState) -> Result<CultureState, ModelError> {
        let r = self.specific_rates(s)?;
        let xv = s.viable_cells_per_L;
        let gln_degradation = self.params.maintenance.K_d_gln_per_h * s.glutamine_mM;

        Ok(CultureState {
            viable_cells_per_L: (r.mu_per_h - r.mu_d_per_h) * xv,
            dead_cells_per_L: r.mu_d_per_h * xv,
            glucose_mM: r.q_glc * xv,
            glutamine_mM: r.q_gln * xv - gln_degradation,
            ammonia_mM: r.q_amm * xv + gln_degradation,
            alanine_mM: r.q_ala * xv,
            arginine_mM: r.transamination.arginine * xv,
            asparagine_mM: r.q_asn * xv,
            aspartate_mM: r.transamination.aspartate * xv,
            cysteine_mM: r.serine.cysteine * xv,
            glutamate_mM: r.transamination.glutamate * xv,
            glycine_mM: r.serine.glycine * xv,
            histidine_mM: r.q_his * xv,
            isoleucine_mM: r.q_ile * xv,
            leucine_mM: r.q_leu * xv,
            lysine_mM: r.q_lys * xv,
            methionine_mM: r.q_met * xv,
            phenylalanine_mM: r.q_phe * xv,
            proline_mM: r.transamination.proline * xv,
            serine_mM: r.serine.serine * xv,
            threonine_mM: r.q_thr * xv,
            tyrosine_mM: r.q_tyr * xv,
            valine_mM: r.q_val * xv,
            lactate_mM: r.q_lac * xv,
        })
    }

    /// Flat-vector form for the integrator: `dydt = f(t, y)`
    pub fn evaluate(&self, t_h: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        if dydt.len() != STATE_LEN {
            return Err(ModelError::StateLength {
                expected: STATE_LEN,
                actual: dydt.len(),
            });
        }
        let state = CultureState::from_slice(y)?;
        let rates = self.derivatives(t_h, &state)?;
        dydt.copy_from_slice(&rates.to_array());
        Ok(())
    }
}
