//! Scale-up train, inoculum and medium composition.

use serde::{Deserialize, Serialize};

use crate::biochemistry::IntegratorConfig;
use crate::error::ConfigError;

/// Baseline ammonia concentration (mM).
///
/// The death-rate law divides by ammonia, so fresh medium starts at this
/// floor instead of exactly zero.
pub const AMMONIA_FLOOR_MM: f64 = 1e-10;

/// One stage of the scale-up train
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassageDescriptor {
    /// Working volume of the vessel (L)
    pub volume_L: f64,
    /// Growth time in this vessel before harvest (h)
    pub duration_h: f64,
}

impl PassageDescriptor {
    pub fn new(volume_L: f64, duration_h: f64) -> Self {
        Self { volume_L, duration_h }
    }
}

/// What to do when an accepted integration sample holds a negative concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativityPolicy {
    /// Log one warning per passage and continue
    #[default]
    Warn,
    /// Abort the run
    Abort,
}

/// Process-level settings for one scale-up run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessParameters {
    /// Vessels in train order
    pub passages: Vec<PassageDescriptor>,
    /// Total cells seeded into the first vessel
    pub inoculum_cells: f64,
    /// Viable fraction of the inoculum
    pub viability_fraction: f64,
    /// Cell count required at the end of the last passage
    pub target_cell_count: f64,
    /// Medium composition every passage starts from
    pub medium: MediumComposition,
    pub solver: IntegratorConfig,
    pub negativity_policy: NegativityPolicy,
}

impl Default for ProcessParameters {
    fn default() -> Self {
        Self {
            passages: vec![
                PassageDescriptor::new(0.1e-3, 16.0),
                PassageDescriptor::new(1e-3, 36.0),
                PassageDescriptor::new(5e-3, 48.0),
                PassageDescriptor::new(20e-3, 72.0),
                PassageDescriptor::new(100e-3, 80.0),
            ],
            inoculum_cells: 1e6,
            viability_fraction: 0.95,
            target_cell_count: 2.16e12,
            medium: MediumComposition::default(),
            solver: IntegratorConfig::default(),
            negativity_policy: NegativityPolicy::Warn,
        }
    }
}

impl ProcessParameters {
    /// Viable cells in the inoculum
    pub fn inoculum_viable_cells(&self) -> f64 {
        self.inoculum_cells * self.viability_fraction
    }

    /// Dead cells in the inoculum
    pub fn inoculum_dead_cells(&self) -> f64 {
        self.inoculum_cells - self.inoculum_viable_cells()
    }

    /// Sum of all passage durations (h)
    pub fn total_duration_h(&self) -> f64 {
        self.passages.iter().map(|p| p.duration_h).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passages.is_empty() {
            return Err(ConfigError::EmptyTrain);
        }
        for (index, passage) in self.passages.iter().enumerate() {
            if !(passage.volume_L.is_finite() && passage.volume_L > 0.0) {
                return Err(ConfigError::InvalidVolume {
                    index,
                    value: passage.volume_L,
                });
            }
            if !(passage.duration_h.is_finite() && passage.duration_h > 0.0) {
                return Err(ConfigError::InvalidDuration {
                    index,
                    value: passage.duration_h,
                });
            }
        }
        if !(self.inoculum_cells.is_finite() && self.inoculum_cells > 0.0) {
            return Err(ConfigError::InvalidInoculum(self.inoculum_cells));
        }
        if !(self.viability_fraction > 0.0 && self.viability_fraction <= 1.0) {
            return Err(ConfigError::InvalidViability(self.viability_fraction));
        }
        if !(self.target_cell_count.is_finite() && self.target_cell_count > 0.0) {
            return Err(ConfigError::InvalidTarget(self.target_cell_count));
        }
        self.medium.validate()?;
        self.solver.validate()
    }
}

/// Baseline metabolite concentrations of fresh medium (mM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediumComposition {
    pub glucose_mM: f64,
    pub glutamine_mM: f64,
    pub ammonia_mM: f64,
    pub alanine_mM: f64,
    pub arginine_mM: f64,
    pub asparagine_mM: f64,
    pub aspartate_mM: f64,
    pub cysteine_mM: f64,
    pub glutamate_mM: f64,
    pub glycine_mM: f64,
    pub histidine_mM: f64,
    pub isoleucine_mM: f64,
    pub leucine_mM: f64,
    pub lysine_mM: f64,
    pub methionine_mM: f64,
    pub phenylalanine_mM: f64,
    pub proline_mM: f64,
    pub serine_mM: f64,
    pub threonine_mM: f64,
    pub tyrosine_mM: f64,
    pub valine_mM: f64,
    pub lactate_mM: f64,
}

impl Default for MediumComposition {
    fn default() -> Self {
        Self {
            glucose_mM: 40.0,
            glutamine_mM: 4.0,
            ammonia_mM: AMMONIA_FLOOR_MM,
            alanine_mM: 1.84,
            arginine_mM: 4.06,
            asparagine_mM: 2.33,
            aspartate_mM: 1.8,
            cysteine_mM: 0.61,
            glutamate_mM: 2.22,
            glycine_mM: 2.25,
            histidine_mM: 0.54,
            isoleucine_mM: 1.93,
            leucine_mM: 2.32,
            lysine_mM: 6.84,
            methionine_mM: 0.56,
            phenylalanine_mM: 0.99,
            proline_mM: 0.53,
            serine_mM: 2.79,
            threonine_mM: 3.23,
            tyrosine_mM: 0.62,
            valine_mM: 1.96,
            lactate_mM: 1e-10,
        }
    }
}

impl MediumComposition {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ammonia_mM.is_finite() && self.ammonia_mM > 0.0) {
            return Err(ConfigError::AmmoniaBaseline(self.ammonia_mM));
        }
        for (species, value) in [
            ("GLC", self.glucose_mM),
            ("GLN", self.glutamine_mM),
            ("ALA", self.alanine_mM),
            ("ARG", self.arginine_mM),
            ("ASN", self.asparagine_mM),
            ("ASP", self.aspartate_mM),
            ("CYS", self.cysteine_mM),
            ("GLU", self.glutamate_mM),
            ("GLY", self.glycine_mM),
            ("HIS", self.histidine_mM),
            ("ILE", self.isoleucine_mM),
            ("LEU", self.leucine_mM),
            ("LYS", self.lysine_mM),
            ("MET", self.methionine_mM),
            ("PHE", self.phenylalanine_mM),
            ("PRO", self.proline_mM),
            ("SER", self.serine_mM),
            ("THR", self.threonine_mM),
            ("TYR", self.tyrosine_mM),
            ("VAL", self.valine_mM),
            ("LAC", self.lactate_mM),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidMedium { species, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_train() {
        let process = ProcessParameters::default();
        assert_eq!(process.passages.len(), 5);
        assert!((process.passages[0].volume_L - 1e-4).abs() < 1e-15);
        assert!((process.passages[4].volume_L - 0.1).abs() < 1e-15);
        assert_eq!(process.total_duration_h(), 252.0);
    }

    #[test]
    fn test_inoculum_split() {
        let process = ProcessParameters::default();
        assert!((process.inoculum_viable_cells() - 9.5e5).abs() < 1e-6);
        assert!((process.inoculum_dead_cells() - 5e4).abs() < 1e-6);
    }

    #[test]
    fn test_zero_volume_rejected() {
        let mut process = ProcessParameters::default();
        process.passages[2].volume_L = 0.0;
        assert!(matches!(
            process.validate(),
            Err(ConfigError::InvalidVolume { index: 2, .. })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut process = ProcessParameters::default();
        process.passages[1].duration_h = -4.0;
        assert!(matches!(
            process.validate(),
            Err(ConfigError::InvalidDuration { index: 1, .. })
        ));
    }

    #[test]
    fn test_empty_train_rejected() {
        let process = ProcessParameters {
            passages: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(process.validate(), Err(ConfigError::EmptyTrain)));
    }

    #[test]
    fn test_zero_ammonia_baseline_rejected() {
        let mut medium = MediumComposition::default();
        medium.ammonia_mM = 0.0;
        assert!(matches!(medium.validate(), Err(ConfigError::AmmoniaBaseline(_))));
    }

    #[test]
    fn test_default_ammonia_is_floor() {
        assert_eq!(MediumComposition::default().ammonia_mM, AMMONIA_FLOOR_MM);
    }

    #[test]
    fn test_policy_serializes_snake_case() {
        let json = serde_json::to_string(&NegativityPolicy::Abort).unwrap();
        assert_eq!(json, "\"abort\"");
    }
}
