//! Writes the future prediction grid as a comma-separated file.
//!
//! Columns: `Tahun`, `Bulan`, one `Pred_<variable>` per trained variable,
//! then `Tanggal` (first day of the month, `%Y-%m-%d`).

use crate::error::Result;
use crate::models::{DATE_COLUMN, MONTH_COLUMN, YEAR_COLUMN};
use crate::pipeline::FutureGrid;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serializes `grid` into `writer`.
pub fn write_forecast<W: Write>(grid: &FutureGrid, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![YEAR_COLUMN.to_string(), MONTH_COLUMN.to_string()];
    header.extend(grid.variables.iter().map(|v| v.prediction_column()));
    header.push(DATE_COLUMN.to_string());
    csv_writer.write_record(&header)?;

    for row in &grid.rows {
        let mut record = vec![row.year.to_string(), row.month.to_string()];
        record.extend(grid.variables.iter().map(|&v| {
            row.prediction(v)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        record.push(row.date.format(DATE_FORMAT).to_string());
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// The export as an in-memory byte buffer.
pub fn forecast_csv_bytes(grid: &FutureGrid) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_forecast(grid, &mut buffer)?;
    Ok(buffer)
}

/// Writes the export to `path`, creating parent directories as needed.
pub fn save_forecast(grid: &FutureGrid, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, forecast_csv_bytes(grid)?)?;
    info!(
        "Wrote {} forecast rows to {}",
        grid.rows.len(),
        path.display()
    );
    Ok(())
}
