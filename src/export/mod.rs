//! Export functionality for scale-up results.
//!
//! Provides CSV trajectory export and JSON report export.

mod csv_export;
mod json_export;

pub use csv_export::{export_trajectories_csv, write_trajectories, CsvExporter, TrajectoryRecord};
pub use json_export::{export_report_json, export_report_json_to, ReportExport};
