//! Per-passage results and the run summary.

use serde::Serialize;

use crate::biochemistry::IntegrationStats;
use crate::state::CultureState;

/// Solution of one passage, in named-state form
#[derive(Debug, Clone, PartialEq)]
pub struct PassageTrajectory {
    /// Time since the passage was seeded (h)
    pub times_h: Vec<f64>,
    pub states: Vec<CultureState>,
}

impl PassageTrajectory {
    /// Sample with the highest viable density (time, density)
    pub fn peak_viable(&self) -> Option<(f64, f64)> {
        self.times_h
            .iter()
            .zip(&self.states)
            .map(|(t, s)| (*t, s.viable_cells_per_L))
            .fold(None, |best: Option<(f64, f64)>, (t, xv)| match best {
                Some((_, best_xv)) if best_xv >= xv => best,
                _ => Some((t, xv)),
            })
    }

    pub fn final_state(&self) -> Option<&CultureState> {
        self.states.last()
    }
}

/// Outcome of one growth-then-dilute stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassageRecord {
    /// Zero-based position in the train
    pub index: usize,
    pub volume_L: f64,
    pub duration_h: f64,
    /// Culture time at which this passage was seeded (h)
    pub start_time_h: f64,
    /// Seeding densities (cells/L)
    pub initial_viable_density: f64,
    pub initial_dead_density: f64,
    /// Harvest densities (cells/L)
    pub final_viable_density: f64,
    pub final_dead_density: f64,
    /// Final over initial viable density
    pub multiplier: f64,
    /// Viable cells harvested (final density × volume)
    pub total_cell_count: f64,
    /// Accepted samples holding at least one negative concentration
    pub negative_samples: usize,
    pub stats: IntegrationStats,
    #[serde(skip)]
    pub trajectory: PassageTrajectory,
}

impl PassageRecord {
    /// Culture time at harvest (h)
    pub fn end_time_h(&self) -> f64 {
        self.start_time_h + self.duration_h
    }

    /// (time, viable density) for charting, time shifted by `offset_h`
    pub fn viable_series(&self, offset_h: f64) -> (Vec<f64>, Vec<f64>) {
        let times = self.trajectory.times_h.iter().map(|t| t + offset_h).collect();
        let viable = self
            .trajectory
            .states
            .iter()
            .map(|s| s.viable_cells_per_L)
            .collect();
        (times, viable)
    }
}

/// Viable-density curve of one passage on the cumulative culture clock
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub times_h: Vec<f64>,
    pub viable_cells_per_L: Vec<f64>,
}

/// Result of a complete scale-up run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleUpReport {
    pub passages: Vec<PassageRecord>,
    /// Cells seeded into the first vessel
    pub inoculum_cells: f64,
    /// Viable cells harvested from the last vessel
    pub final_cell_count: f64,
    pub target_cell_count: f64,
    pub target_reached: bool,
    /// Sum of passage durations (h)
    pub total_elapsed_h: f64,
    /// Time of maximal viable density within the last passage (h since its seeding)
    pub peak_viable_time_h: f64,
}

impl ScaleUpReport {
    /// Cell counts: the inoculum followed by each passage's harvest
    pub fn cell_counts(&self) -> Vec<f64> {
        std::iter::once(self.inoculum_cells)
            .chain(self.passages.iter().map(|p| p.total_cell_count))
            .collect()
    }

    /// Growth multiplier of each passage
    pub fn multipliers(&self) -> Vec<f64> {
        self.passages.iter().map(|p| p.multiplier).collect()
    }

    /// Seeding viable density of each passage (cells/L)
    pub fn inoculum_densities(&self) -> Vec<f64> {
        self.passages.iter().map(|p| p.initial_viable_density).collect()
    }

    pub fn total_elapsed_days(&self) -> f64 {
        self.total_elapsed_h / 24.0
    }

    /// One curve per passage, each shifted to its seeding time
    pub fn chart_series(&self) -> Vec<ChartSeries> {
        self.passages
            .iter()
            .map(|p| {
                let (times_h, viable_cells_per_L) = p.viable_series(p.start_time_h);
                ChartSeries {
                    label: format!("passage {}", p.index + 1),
                    times_h,
                    viable_cells_per_L,
                }
            })
            .collect()
    }
}
