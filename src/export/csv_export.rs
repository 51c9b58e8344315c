//! CSV time-series export for passage trajectories.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::scaleup::{PassageRecord, ScaleUpReport};
use crate::state::CultureState;

/// One accepted integrator sample
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryRecord {
    /// Passage number (1-based)
    pub passage: usize,
    /// Time since the passage was seeded (h)
    pub time_h: f64,
    /// Time on the cumulative culture clock (h)
    pub culture_time_h: f64,
    /// Viable cells (cells/L)
    pub viable_cells_per_L: f64,
    /// Dead cells (cells/L)
    pub dead_cells_per_L: f64,
    pub glucose_mM: f64,
    pub glutamine_mM: f64,
    pub ammonia_mM: f64,
    pub lactate_mM: f64,
}

impl TrajectoryRecord {
    fn new(passage: &PassageRecord, time_h: f64, s: &CultureState) -> Self {
        Self {
            passage: passage.index + 1,
            time_h,
            culture_time_h: passage.start_time_h + time_h,
            viable_cells_per_L: s.viable_cells_per_L,
            dead_cells_per_L: s.dead_cells_per_L,
            glucose_mM: s.glucose_mM,
            glutamine_mM: s.glutamine_mM,
            ammonia_mM: s.ammonia_mM,
            lactate_mM: s.lactate_mM,
        }
    }
}

/// CSV exporter for passage trajectories
pub struct CsvExporter {
    writer: csv::Writer<File>,
    /// Rows written so far
    rows: usize,
    /// Path to output file
    path: PathBuf,
}

impl CsvExporter {
    /// Create an exporter in `exports/`
    ///
    /// Creates the exports directory if it doesn't exist.
    /// Filename is auto-generated with timestamp.
    pub fn new() -> Result<Self> {
        let dir = PathBuf::from("exports");
        std::fs::create_dir_all(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("trajectory_{}.csv", timestamp));
        Self::create(path)
    }

    /// Create an exporter writing to a specific file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            rows: 0,
            path,
        })
    }

    /// Write every sample of one passage
    pub fn record_passage(&mut self, passage: &PassageRecord) -> Result<()> {
        self.rows += write_trajectories(&mut self.writer, std::slice::from_ref(passage))?;
        Ok(())
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!(
            "CSV export completed: {} ({} rows)",
            self.path.display(),
            self.rows
        );
        Ok(self.path)
    }
}

/// Serialize the samples of `passages` into `writer`, returning the row count
pub fn write_trajectories<W: Write>(
    writer: &mut csv::Writer<W>,
    passages: &[PassageRecord],
) -> Result<usize> {
    let mut rows = 0;
    for passage in passages {
        let traj = &passage.trajectory;
        for (t, state) in traj.times_h.iter().zip(&traj.states) {
            writer.serialize(TrajectoryRecord::new(passage, *t, state))?;
            rows += 1;
        }
    }
    Ok(rows)
}

/// Export all passage trajectories of a report to `exports/trajectory_*.csv`
pub fn export_trajectories_csv(report: &ScaleUpReport) -> Result<PathBuf> {
    let mut exporter = CsvExporter::new()?;
    for passage in &report.passages {
        exporter.record_passage(passage)?;
    }
    exporter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biochemistry::IntegrationStats;
    use crate::scaleup::PassageTrajectory;

    fn record() -> PassageRecord {
        let state = CultureState {
            viable_cells_per_L: 1e10,
            glucose_mM: 40.0,
            ..Default::default()
        };
        PassageRecord {
            index: 1,
            volume_L: 1e-3,
            duration_h: 1.0,
            start_time_h: 16.0,
            initial_viable_density: 1e10,
            initial_dead_density: 0.0,
            final_viable_density: 1e10,
            final_dead_density: 0.0,
            multiplier: 1.0,
            total_cell_count: 1e7,
            negative_samples: 0,
            stats: IntegrationStats::default(),
            trajectory: PassageTrajectory {
                times_h: vec![0.0, 0.5, 1.0],
                states: vec![state; 3],
            },
        }
    }

    #[test]
    fn test_rows_carry_passage_and_culture_clock() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let rows = write_trajectories(&mut writer, &[record()]).unwrap();
        assert_eq!(rows, 3);

        let bytes = writer.into_inner().ok().expect("csv writer flushes into memory");
        let data = String::from_utf8(bytes).unwrap();
        let mut lines = data.lines();
        assert_eq!(
            lines.next().unwrap(),
            "passage,time_h,culture_time_h,viable_cells_per_L,dead_cells_per_L,\
             glucose_mM,glutamine_mM,ammonia_mM,lactate_mM"
        );
        assert!(lines.nth(1).unwrap().starts_with("2,0.5,16.5,"));
    }

    #[test]
    fn test_exporter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        let mut exporter = CsvExporter::create(&path).unwrap();
        exporter.record_passage(&record()).unwrap();
        let written = exporter.finish().unwrap();
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4, "header plus three samples");
    }
}
