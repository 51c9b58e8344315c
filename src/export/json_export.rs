//! JSON export of the scale-up report.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::scaleup::ScaleUpReport;

/// Report export structure
#[derive(Debug, Clone, Serialize)]
pub struct ReportExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    pub report: &'a ScaleUpReport,
}

impl<'a> ReportExport<'a> {
    fn now(report: &'a ScaleUpReport) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: "1.0.0",
            report,
        }
    }
}

/// Export a report to JSON
///
/// Creates the exports directory if it doesn't exist.
/// Filename is auto-generated with timestamp: `report_YYYYMMDD_HHMMSS.json`
///
/// Returns the path to the saved JSON file.
pub fn export_report_json(report: &ScaleUpReport) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    std::fs::create_dir_all(&dir)?;

    let timestamp = Local::now();
    let filename = format!("report_{}.json", timestamp.format("%Y%m%d_%H%M%S"));
    let path = dir.join(&filename);

    export_report_json_to(report, &path)?;
    Ok(path)
}

/// Export a report to a specific file
pub fn export_report_json_to<P: AsRef<Path>>(report: &ScaleUpReport, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &ReportExport::now(report))?;

    log::info!("JSON report exported: {}", path.display());
    Ok(())
}
