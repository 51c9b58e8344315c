//! Culture state: cell densities and medium composition at one instant.
//!
//! The integrator works on a flat `[f64; STATE_LEN]`; everything else works on
//! `CultureState`. `to_array` and `from_slice` are the only functions that know
//! the index order.

use serde::{Deserialize, Serialize};

use crate::config::MediumComposition;
use crate::error::ModelError;

/// Number of entries in the flat state vector (2 cell densities + 22 metabolites)
pub const STATE_LEN: usize = 24;

/// Index of the first metabolite in the flat state vector
pub const FIRST_METABOLITE: usize = 2;

/// Labels for the flat state vector, in index order
pub const SPECIES_NAMES: [&str; STATE_LEN] = [
    "Xv", "Xd", "GLC", "GLN", "AMM", "ALA", "ARG", "ASN", "ASP", "CYS", "GLU", "GLY", "HIS",
    "ILE", "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TYR", "VAL", "LAC",
];

/// One instant of the culture.
///
/// Also used for time derivatives, in which case every field is a rate
/// (cells/L/h or mM/h).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CultureState {
    /// Viable cell density (cells/L)
    pub viable_cells_per_L: f64,
    /// Dead cell density (cells/L)
    pub dead_cells_per_L: f64,
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

impl CultureState {
    /// Fresh passage state: carried-over cells in baseline medium
    pub fn from_cells_and_medium(
        viable_cells_per_L: f64,
        dead_cells_per_L: f64,
        medium: &MediumComposition,
    ) -> Self {
        Self {
            viable_cells_per_L,
            dead_cells_per_L,
            glucose_mM: medium.glucose_mM,
            glutamine_mM: medium.glutamine_mM,
            ammonia_mM: medium.ammonia_mM,
            alanine_mM: medium.alanine_mM,
            arginine_mM: medium.arginine_mM,
            asparagine_mM: medium.asparagine_mM,
            aspartate_mM: medium.aspartate_mM,
            cysteine_mM: medium.cysteine_mM,
            glutamate_mM: medium.glutamate_mM,
            glycine_mM: medium.glycine_mM,
            histidine_mM: medium.histidine_mM,
            isoleucine_mM: medium.isoleucine_mM,
            leucine_mM: medium.leucine_mM,
            lysine_mM: medium.lysine_mM,
            methionine_mM: medium.methionine_mM,
            phenylalanine_mM: medium.phenylalanine_mM,
            proline_mM: medium.proline_mM,
            serine_mM: medium.serine_mM,
            threonine_mM: medium.threonine_mM,
            tyrosine_mM: medium.tyrosine_mM,
            valine_mM: medium.valine_mM,
            lactate_mM: medium.lactate_mM,
        }
    }

    /// Decode a flat state vector
    pub fn from_slice(y: &[f64]) -> Result<Self, ModelError> {
        if y.len() != STATE_LEN {
            return Err(ModelError::StateLength {
                expected: STATE_LEN,
                actual: y.len(),
            });
        }
        Ok(Self {
            viable_cells_per_L: y[0],
            dead_cells_per_L: y[1],
            glucose_mM: y[2],
            glutamine_mM: y[3],
            ammonia_mM: y[4],
            alanine_mM: y[5],
            arginine_mM: y[6],
            asparagine_mM: y[7],
            aspartate_mM: y[8],
            cysteine_mM: y[9],
            glutamate_mM: y[10],
            glycine_mM: y[11],
            histidine_mM: y[12],
            isoleucine_mM: y[13],
            leucine_mM: y[14],
            lysine_mM: y[15],
            methionine_mM: y[16],
            phenylalanine_mM: y[17],
            proline_mM: y[18],
            serine_mM: y[19],
            threonine_mM: y[20],
            tyrosine_mM: y[21],
            valine_mM: y[22],
            lactate_mM: y[23],
        })
    }

    /// Encode as a flat state vector (order of `SPECIES_NAMES`)
    pub fn to_array(&self) -> [f64; STATE_LEN] {
        [
            self.viable_cells_per_L,
            self.dead_cells_per_L,
            self.glucose_mM,
            self.glutamine_mM,
            self.ammonia_mM,
            self.alanine_mM,
            self.arginine_mM,
            self.asparagine_mM,
            self.aspartate_mM,
            self.cysteine_mM,
            self.glutamate_mM,
            self.glycine_mM,
            self.histidine_mM,
            self.isoleucine_mM,
            self.leucine_mM,
            self.lysine_mM,
            self.methionine_mM,
            self.phenylalanine_mM,
            self.proline_mM,
            self.serine_mM,
            self.threonine_mM,
            self.tyrosine_mM,
            self.valine_mM,
            self.lactate_mM,
        ]
    }

    /// Most negative metabolite concentration, if any is below zero
    pub fn min_concentration(&self) -> Option<(&'static str, f64)> {
        let values = self.to_array();
        values[FIRST_METABOLITE..]
            .iter()
            .zip(&SPECIES_NAMES[FIRST_METABOLITE..])
            .filter(|(v, _)| **v < 0.0)
            .min_by(|a, b| a.0.total_cmp(b.0))
            .map(|(v, name)| (*name, *v))
    }
}
