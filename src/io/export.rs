//! Export reconciled rows to CSV.
//!
//! One column per series (named by its key) followed by the derived spreads,
//! so the file opens cleanly in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ReconciledPoint, SeriesKey, SpreadKey};
use crate::error::AppError;

/// Write reconciled rows to a CSV file.
pub fn write_series_csv(path: &Path, points: &[ReconciledPoint]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_series(file, points)?;
    tracing::info!(path = %path.display(), rows = points.len(), "wrote series CSV");
    Ok(())
}

/// Write reconciled rows as CSV to any writer.
pub fn write_series<W: Write>(out: W, points: &[ReconciledPoint]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(out);
    let keys: Vec<&SeriesKey> = points.first().map(|p| p.values.keys().collect()).unwrap_or_default();

    let mut header = vec!["date".to_string()];
    header.extend(keys.iter().map(|k| k.to_string()));
    header.extend(SpreadKey::ALL.iter().map(|s| spread_column(*s).to_string()));
    wtr.write_record(&header)
        .map_err(|e| AppError::Io(format!("Failed to write export CSV header: {e}")))?;

    for p in points {
        let mut record = vec![p.date.format("%Y-%m-%d").to_string()];
        record.extend(keys.iter().map(|k| format!("{:.4}", p.value(k).unwrap_or(0.0))));
        record.extend(
            SpreadKey::ALL
                .iter()
                .map(|s| format!("{:.4}", p.spread(*s).unwrap_or(0.0))),
        );
        wtr.write_record(&record)
            .map_err(|e| AppError::Io(format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::Io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn spread_column(key: SpreadKey) -> &'static str {
    match key {
        SpreadKey::VsFedFunds => "spread_vs_fed_funds",
        SpreadKey::VsTBill => "spread_vs_tbill",
    }
}
