//! Passage driver: runs the scale-up train end to end.
//!
//! Each passage seeds fresh medium with the cells carried over from the
//! previous vessel, integrates the rate model for the passage duration, then
//! dilutes the harvest into the next vessel. Passages are strictly serial;
//! independent trains may run in parallel since the driver holds no mutable
//! state.

use crate::biochemistry::{DormandPrince, RateModel};
use crate::config::{
    KineticParameters, NegativityPolicy, Parameters, PassageDescriptor, ProcessParameters,
};
use crate::error::{ConfigError, IntegrationError, SimulationError};
use crate::state::CultureState;

use super::record::{PassageRecord, PassageTrajectory, ScaleUpReport};

/// Density after transferring cells from one vessel volume into another
///
/// The cell count is conserved; only the concentration changes.
#[inline]
pub fn dilute(density_per_L: f64, from_volume_L: f64, to_volume_L: f64) -> f64 {
    density_per_L * from_volume_L / to_volume_L
}

/// Runs a complete scale-up train.
#[derive(Debug, Clone)]
pub struct PassageDriver {
    model: RateModel,
    process: ProcessParameters,
    integrator: DormandPrince,
}

impl PassageDriver {
    /// Validate the configuration and build a driver
    pub fn new(kinetics: KineticParameters, process: ProcessParameters) -> Result<Self, ConfigError> {
        process.validate()?;
        let model = RateModel::new(kinetics)?;
        let integrator = DormandPrince::new(process.solver.clone());
        Ok(Self {
            model,
            process,
            integrator,
        })
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self, ConfigError> {
        Self::new(params.kinetics.clone(), params.process.clone())
    }

    pub fn model(&self) -> &RateModel {
        &self.model
    }

    pub fn process(&self) -> &ProcessParameters {
        &self.process
    }

    /// Run every passage in order.
    ///
    /// All-or-nothing: the first failure aborts the run and no partial report
    /// is returned.
    pub fn run(&self) -> Result<ScaleUpReport, SimulationError> {
        let passages = &self.process.passages;
        let first = passages.first().ok_or(ConfigError::EmptyTrain)?;

        log::info!(
            "Starting scale-up: {} passages, {:.3e} cells at {:.0}% viability",
            passages.len(),
            self.process.inoculum_cells,
            self.process.viability_fraction * 100.0
        );

        let mut viable = self.process.inoculum_viable_cells() / first.volume_L;
        let mut dead = self.process.inoculum_dead_cells() / first.volume_L;
        let mut elapsed_h = 0.0;
        let mut records = Vec::with_capacity(passages.len());

        for (index, passage) in passages.iter().enumerate() {
            let record = self.run_passage(index, passage, viable, dead, elapsed_h)?;
            elapsed_h += passage.duration_h;

            if let Some(next) = passages.get(index + 1) {
                viable = record.total_cell_count / next.volume_L;
                dead = dilute(record.final_dead_density, passage.volume_L, next.volume_L);
            }
            records.push(record);
        }

        let last = records.last().ok_or(ConfigError::EmptyTrain)?;
        let (peak_viable_time_h, peak_density) = last
            .trajectory
            .peak_viable()
            .unwrap_or((last.duration_h, last.final_viable_density));
        log::info!(
            "Last passage peaks at {:.3e} cells/L after {:.2} h",
            peak_density,
            peak_viable_time_h
        );

        let final_cell_count = last.total_cell_count;
        let target_cell_count = self.process.target_cell_count;
        let target_reached = final_cell_count > target_cell_count;
        log::info!(
            "Scale-up finished after {} h: {:.3e} cells (target {:.3e}, reached: {})",
            elapsed_h,
            final_cell_count,
            target_cell_count,
            target_reached
        );

        Ok(ScaleUpReport {
            passages: records,
            inoculum_cells: self.process.inoculum_cells,
            final_cell_count,
            target_cell_count,
            target_reached,
            total_elapsed_h: elapsed_h,
            peak_viable_time_h,
        })
    }

    /// Grow one passage from the given seeding densities
    pub fn run_passage(
        &self,
        index: usize,
        passage: &PassageDescriptor,
        viable_density: f64,
        dead_density: f64,
        start_time_h: f64,
    ) -> Result<PassageRecord, SimulationError> {
        let initial =
            CultureState::from_cells_and_medium(viable_density, dead_density, &self.process.medium);

        let trajectory = self
            .integrator
            .integrate(
                |t, y, dydt| self.model.evaluate(t, y, dydt),
                (0.0, passage.duration_h),
                &initial.to_array(),
            )
            .map_err(|source| SimulationError::Passage {
                passage: index,
                source,
            })?;

        let states = trajectory
            .states
            .iter()
            .zip(&trajectory.times_h)
            .map(|(y, &t_h)| {
                CultureState::from_slice(y).map_err(|source| SimulationError::Passage {
                    passage: index,
                    source: IntegrationError::Model { t_h, source },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let trajectory_named = PassageTrajectory {
            times_h: trajectory.times_h,
            states,
        };

        let negative_samples = self.check_non_negative(index, &trajectory_named)?;

        let final_state = trajectory_named
            .final_state()
            .copied()
            .unwrap_or(initial);
        let final_viable_density = final_state.viable_cells_per_L;
        let final_dead_density = final_state.dead_cells_per_L;
        let multiplier = final_viable_density / viable_density;
        let total_cell_count = final_viable_density * passage.volume_L;

        log::info!(
            "Passage {}: {:.3e} -> {:.3e} cells/L (x{:.3}), {:.3e} cells in {} L",
            index + 1,
            viable_density,
            final_viable_density,
            multiplier,
            total_cell_count,
            passage.volume_L
        );

        Ok(PassageRecord {
            index,
            volume_L: passage.volume_L,
            duration_h: passage.duration_h,
            start_time_h,
            initial_viable_density: viable_density,
            initial_dead_density: dead_density,
            final_viable_density,
            final_dead_density,
            multiplier,
            total_cell_count,
            negative_samples,
            stats: trajectory.stats,
            trajectory: trajectory_named,
        })
    }

    /// Count samples with negative metabolite concentrations, applying the policy
    fn check_non_negative(
        &self,
        index: usize,
        trajectory: &PassageTrajectory,
    ) -> Result<usize, SimulationError> {
        let mut first = None;
        let mut count = 0;
        for (t_h, state) in trajectory.times_h.iter().zip(&trajectory.states) {
            if let Some((species, value_mM)) = state.min_concentration() {
                count += 1;
                first.get_or_insert((*t_h, species, value_mM));
            }
        }

        if let Some((t_h, species, value_mM)) = first {
            match self.process.negativity_policy {
                NegativityPolicy::Abort => {
                    return Err(SimulationError::NegativeConcentration {
                        passage: index,
                        species,
                        value_mM,
                        t_h,
                    });
                }
                NegativityPolicy::Warn => log::warn!(
                    "Passage {}: {} went negative ({:.3e} mM) at t = {:.2} h; {} samples affected",
                    index + 1,
                    species,
                    value_mM,
                    t_h,
                    count
                ),
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilute_conserves_count() {
        let density = 4.2e9;
        let diluted = dilute(density, 1e-3, 5e-3);
        assert!((diluted * 5e-3 - density * 1e-3).abs() < 1e-9 * density * 1e-3);
    }

    #[test]
    fn test_invalid_process_rejected() {
        let mut process = ProcessParameters::default();
        process.passages[0].duration_h = 0.0;
        assert!(PassageDriver::new(KineticParameters::default(), process).is_err());
    }

    #[test]
    fn test_short_passage_grows() {
        let process = ProcessParameters {
            passages: vec![PassageDescriptor::new(1e-4, 1.0)],
            ..Default::default()
        };
        let driver = PassageDriver::new(KineticParameters::default(), process).unwrap();
        let report = driver.run().unwrap();
        let record = &report.passages[0];
        assert!(record.multiplier > 1.0);
        assert_eq!(record.negative_samples, 0);
        assert_eq!(*record.trajectory.times_h.last().unwrap(), 1.0);
    }
}
