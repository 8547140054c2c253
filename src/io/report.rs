//! Read/write report JSON files.
//!
//! Report JSON is the portable form of a spread run (`domain::SpreadReport`):
//! window, reconciled rows, metrics, TVL rows and the current-rate snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::SpreadReport;
use crate::error::AppError;

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &SpreadReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create report JSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AppError::Io(format!("Failed to write report JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to write report JSON: {e}")))?;

    tracing::info!(path = %path.display(), "wrote report JSON");
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<SpreadReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::InvalidInput(format!("Invalid report JSON '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::app::pipeline::build_report;
    use crate::domain::{DateRange, RateObservation, RiskFreeHistory, RiskFreeSeries};

    #[test]
    fn saved_report_reloads_unchanged() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rates = vec![RiskFreeHistory {
            series: RiskFreeSeries::FedFunds,
            observations: vec![RateObservation { date: "2024-01-01".into(), value: "5.33".into() }],
        }];
        let now = start.and_hms_opt(9, 30, 0).unwrap().and_utc();
        let report = build_report(&[], &rates, DateRange { start, end: start }, now);

        let path = std::env::temp_dir().join(format!("defi-spread-report-{}.json", std::process::id()));
        write_report_json(&path, &report).unwrap();
        let back = read_report_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back, report);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_report_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
