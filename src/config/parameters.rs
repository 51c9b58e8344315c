//! Kinetic parameter set for the HEK293 rate model.
//!
//! Loaded once per run and never mutated. Values are the documented defaults
//! for HEK293 in serum-free fed-batch medium; every yield carries its unit.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::process::ProcessParameters;
use crate::error::ConfigError;

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    /// Rate-law constants
    pub kinetics: KineticParameters,
    /// Scale-up train, inoculum, medium and solver settings
    pub process: ProcessParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory, falling back to defaults per file
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let kinetics = load_json_or_default(dir.join("kinetics.json"), "kinetic");
        let process = load_json_or_default(dir.join("process.json"), "process");

        Self { kinetics, process }
    }

    /// Load both files from `dir`, failing on any missing or malformed file
    pub fn load_strict<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let params = Self {
            kinetics: load_json(dir.join("kinetics.json"))?,
            process: load_json(dir.join("process.json"))?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kinetics.validate()?;
        self.process.validate()
    }
}

/// Read and parse one JSON parameter file
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded parameters from {:?}", path);
    Ok(parsed)
}

/// Load from JSON file or return defaults
fn load_json_or_default<T: DeserializeOwned + Default>(path: impl AsRef<Path>, label: &str) -> T {
    let path = path.as_ref();
    match load_json(path) {
        Ok(params) => params,
        Err(ConfigError::Io { .. }) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
        Err(e) => {
            log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
            T::default()
        }
    }
}

/// Complete rate-law parameter set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticParameters {
    pub growth: GrowthParameters,
    pub death: DeathParameters,
    pub maintenance: MaintenanceParameters,
    pub yields: YieldCoefficients,
}

impl KineticParameters {
    /// Reject values that would make a rate law undefined
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.growth;
        let m = &g.monod;
        let d = &self.death;
        let k = &self.maintenance;
        let y = &self.yields;

        non_negative("mu_min_per_h", g.mu_min_per_h)?;
        if !(g.mu_max_per_h.is_finite() && g.mu_max_per_h >= g.mu_min_per_h) {
            return Err(ConfigError::InvalidParameter {
                name: "mu_max_per_h",
                value: g.mu_max_per_h,
            });
        }

        for (name, value) in [
            ("K_glc_mM", m.K_glc_mM),
            ("K_gln_mM", m.K_gln_mM),
            ("K_asp_mM", m.K_asp_mM),
            ("K_arg_mM", m.K_arg_mM),
            ("K_val_mM", m.K_val_mM),
            ("K_lys_mM", m.K_lys_mM),
            ("K_thr_mM", m.K_thr_mM),
            ("K_his_mM", m.K_his_mM),
            ("K_ser_mM", m.K_ser_mM),
            ("K_ile_mM", m.K_ile_mM),
            ("K_phe_mM", m.K_phe_mM),
            ("K_leu_mM", m.K_leu_mM),
            ("K_d_amm_mM", d.K_d_amm_mM),
            ("d_n", d.d_n),
            ("a2_mM", k.a2_mM),
        ] {
            positive(name, value)?;
        }

        for (name, value) in [
            ("mu_d_max_per_h", d.mu_d_max_per_h),
            ("K_lysis", d.K_lysis),
            ("K_d_gln_per_h", k.K_d_gln_per_h),
            ("a1", k.a1),
            ("M_glc", k.M_glc),
        ] {
            non_negative(name, value)?;
        }

        // Yields on biomass appear as divisors of mu.
        for (name, value) in [
            ("Y_x_gln", y.Y_x_gln),
            ("Y_x_glc", y.Y_x_glc),
            ("Y_x_ala", y.Y_x_ala),
            ("Y_x_arg", y.Y_x_arg),
            ("Y_x_asp", y.Y_x_asp),
            ("Y_x_cys", y.Y_x_cys),
            ("Y_x_glu", y.Y_x_glu),
            ("Y_x_his", y.Y_x_his),
            ("Y_x_ile", y.Y_x_ile),
            ("Y_x_leu", y.Y_x_leu),
            ("Y_x_lys", y.Y_x_lys),
            ("Y_x_met", y.Y_x_met),
            ("Y_x_phe", y.Y_x_phe),
            ("Y_x_pro", y.Y_x_pro),
            ("Y_x_ser", y.Y_x_ser),
            ("Y_x_thr", y.Y_x_thr),
            ("Y_x_tyr", y.Y_x_tyr),
            ("Y_x_val", y.Y_x_val),
            ("Y_gly_ser", y.Y_gly_ser),
        ] {
            positive(name, value)?;
        }

        for (name, value) in [
            ("Y_gln_glu", y.Y_gln_glu),
            ("Y_amm_gln", y.Y_amm_gln),
            ("Y_ala_x", y.Y_ala_x),
            ("Y_arg_asp", y.Y_arg_asp),
            ("Y_arg_glu", y.Y_arg_glu),
            ("Y_arg_pro", y.Y_arg_pro),
            ("Y_asn_asp", y.Y_asn_asp),
            ("Y_asp_arg", y.Y_asp_arg),
            ("Y_asp_x", y.Y_asp_x),
            ("Y_cys_ser", y.Y_cys_ser),
            ("Y_glu_arg", y.Y_glu_arg),
            ("Y_glu_gln", y.Y_glu_gln),
            ("Y_glu_his", y.Y_glu_his),
            ("Y_glu_pro", y.Y_glu_pro),
            ("Y_glu_x", y.Y_glu_x),
            ("Y_lac_glc", y.Y_lac_glc),
            ("Y_lys_x", y.Y_lys_x),
            ("Y_pro_arg", y.Y_pro_arg),
            ("Y_pro_glu", y.Y_pro_glu),
            ("Y_ser_gly", y.Y_ser_gly),
            ("Y_tyr_phe", y.Y_tyr_phe),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

/// Specific growth rate bounds and Monod limitation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParameters {
    /// Minimum specific growth rate (1/h), reached when any substrate is exhausted
    pub mu_min_per_h: f64,
    /// Maximum specific growth rate (1/h)
    pub mu_max_per_h: f64,
    pub monod: MonodConstants,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            mu_min_per_h: 2e-2,
            mu_max_per_h: 6.5e-2,
            monod: MonodConstants::default(),
        }
    }
}

/// Half-saturation constants of the twelve growth-limiting substrates (mM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonodConstants {
    pub K_glc_mM: f64,
    pub K_gln_mM: f64,
    pub K_asp_mM: f64,
    pub K_arg_mM: f64,
    pub K_val_mM: f64,
    pub K_lys_mM: f64,
    pub K_thr_mM: f64,
    pub K_his_mM: f64,
    pub K_ser_mM: f64,
    pub K_ile_mM: f64,
    pub K_phe_mM: f64,
    pub K_leu_mM: f64,
}

impl Default for MonodConstants {
    fn default() -> Self {
        Self {
            K_glc_mM: 3e-2,
            K_gln_mM: 3e-3,
            K_asp_mM: 1e-1,
            K_arg_mM: 2.5e-2,
            K_val_mM: 2.5e-2,
            K_lys_mM: 2e-2,
            K_thr_mM: 5e-2,
            K_his_mM: 1e-2,
            K_ser_mM: 2.5e-2,
            K_ile_mM: 5e-2,
            K_phe_mM: 5e-2,
            K_leu_mM: 1.5e-2,
        }
    }
}

/// Ammonia-driven death kinetics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathParameters {
    /// Maximum specific death rate (1/h)
    pub mu_d_max_per_h: f64,
    /// Ammonia level at half-maximal death rate (mM)
    pub K_d_amm_mM: f64,
    /// Steepness exponent of the ammonia sigmoid
    pub d_n: f64,
    /// Lysis constant. Carried in the parameter set but not used by the
    /// dead-cell balance.
    pub K_lysis: f64,
}

impl Default for DeathParameters {
    fn default() -> Self {
        Self {
            mu_d_max_per_h: 1e-2,
            K_d_amm_mM: 15.0,
            d_n: 2.3,
            K_lysis: 1.3e-2,
        }
    }
}

/// Spontaneous degradation and maintenance terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceParameters {
    /// First-order glutamine degradation to ammonia (1/h)
    pub K_d_gln_per_h: f64,
    /// Glutamine maintenance α₁ (mmol/cell/h)
    pub a1: f64,
    /// Glutamine maintenance α₂ (mM)
    pub a2_mM: f64,
    /// Glucose maintenance coefficient (mmol/cell/h)
    pub M_glc: f64,
}

impl Default for MaintenanceParameters {
    fn default() -> Self {
        Self {
            K_d_gln_per_h: 9e-3,
            a1: 3.4e-13,
            a2_mM: 4.0,
            M_glc: 4.8e-14,
        }
    }
}

/// Yield coefficients.
///
/// `Y_x_*` are cells per mmol of substrate. `Y_*_x` are mmol per cell per
/// hour. `Y_a_b` between two species are mmol/mmol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldCoefficients {
    pub Y_x_gln: f64,
    pub Y_x_glc: f64,
    pub Y_x_ala: f64,
    pub Y_x_arg: f64,
    pub Y_x_asp: f64,
    pub Y_x_cys: f64,
    pub Y_x_glu: f64,
    pub Y_x_his: f64,
    pub Y_x_ile: f64,
    pub Y_x_leu: f64,
    pub Y_x_lys: f64,
    pub Y_x_met: f64,
    pub Y_x_phe: f64,
    pub Y_x_pro: f64,
    pub Y_x_ser: f64,
    pub Y_x_thr: f64,
    pub Y_x_tyr: f64,
    pub Y_x_val: f64,

    pub Y_ala_x: f64,
    pub Y_asp_x: f64,
    pub Y_glu_x: f64,
    pub Y_lys_x: f64,

    pub Y_gln_glu: f64,
    pub Y_amm_gln: f64,
    pub Y_arg_asp: f64,
    pub Y_arg_glu: f64,
    pub Y_arg_pro: f64,
    pub Y_asn_asp: f64,
    pub Y_asp_arg: f64,
    pub Y_cys_ser: f64,
    pub Y_glu_arg: f64,
    pub Y_glu_gln: f64,
    pub Y_glu_his: f64,
    pub Y_glu_pro: f64,
    pub Y_gly_ser: f64,
    pub Y_lac_glc: f64,
    pub Y_pro_arg: f64,
    pub Y_pro_glu: f64,
    pub Y_ser_gly: f64,
    pub Y_tyr_phe: f64,
}

impl Default for YieldCoefficients {
    fn default() -> Self {
        Self {
            Y_x_gln: 4e8,
            Y_x_glc: 1.4e8,
            Y_x_ala: 1.5e10,
            Y_x_arg: 4.6e9,
            Y_x_asp: 2.5e9,
            Y_x_cys: 2e9,
            Y_x_glu: 6.5e9,
            Y_x_his: 2.4e10,
            Y_x_ile: 6.85e9,
            Y_x_leu: 2.5e9,
            Y_x_lys: 6.3e9,
            Y_x_met: 1.9e10,
            Y_x_phe: 1.4e10,
            Y_x_pro: 1e11,
            Y_x_ser: 1.3e9,
            Y_x_thr: 1e10,
            Y_x_tyr: 4.3e9,
            Y_x_val: 6e9,

            Y_ala_x: 8e-12,
            Y_asp_x: 1e-15,
            Y_glu_x: 2e-16,
            Y_lys_x: 2e-14,

            Y_gln_glu: 1.0,
            Y_amm_gln: 0.9,
            Y_arg_asp: 1e-2,
            Y_arg_glu: 1e-2,
            Y_arg_pro: 1e-2,
            Y_asn_asp: 0.18,
            Y_asp_arg: 1e-2,
            Y_cys_ser: 1.0,
            Y_glu_arg: 1e-3,
            Y_glu_gln: 0.2,
            Y_glu_his: 1.0,
            Y_glu_pro: 1e-2,
            Y_gly_ser: 0.4,
            Y_lac_glc: 1.2,
            Y_pro_arg: 1.2,
            Y_pro_glu: 1.0,
            Y_ser_gly: 0.1,
            Y_tyr_phe: 1.0,
        }
    }
}
