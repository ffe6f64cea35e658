//! Loads daily climate observations from a workbook sheet or a CSV file.
//!
//! Reading happens in two steps: the file is first turned into a `RawTable`
//! (header names plus loosely typed cells), which `normalize` then converts
//! into a `Dataset`. Keeping the second step independent of the file format
//! lets both readers share the column handling and date parsing.

use crate::error::{AppError, Result};
use crate::models::{Dataset, Observation, Variable, DATE_COLUMN, WIND_SPEED_SYNONYM};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Day-first date layouts accepted in text cells, plus ISO dates.
const DATE_FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 8] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Largest serial number Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// A loosely typed cell value as read from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

/// A table exactly as read: a header row and data rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Loads a dataset from `path`.
///
/// Workbook formats are read from `sheet`; `.csv` files ignore the sheet name.
pub fn load(path: &Path, sheet: &str) -> Result<Dataset> {
    info!("Loading climate data from {}", path.display());
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet)?,
        "csv" => read_csv(path)?,
        other => {
            return Err(AppError::Config(format!(
                "Unsupported input file type '{}' for {}",
                other,
                path.display()
            )))
        },
    };

    let dataset = normalize(table)?;
    info!(
        "Loaded {} daily rows with {} recognized variables",
        dataset.observations.len(),
        dataset.variables.len()
    );
    Ok(dataset)
}

/// Reads one worksheet into a `RawTable`. The first row is the header.
pub fn read_workbook(path: &Path, sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range(sheet)?;
    debug!("Sheet '{}' has {:?} cells", sheet, range.get_size());

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => return Ok(RawTable::default()),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Reads a comma-separated file with a header row into a `RawTable`.
pub fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        },
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

/// Turns a raw table into a `Dataset`.
///
/// Header names are trimmed, `kecepatan_angin` becomes `FF_X`, and only the
/// first column of any repeated name is kept. The date column is required;
/// the set of variables is whatever recognized columns remain.
pub fn normalize(table: RawTable) -> Result<Dataset> {
    let mut seen = HashSet::new();
    let mut date_index = None;
    let mut variable_columns: Vec<(usize, Variable)> = Vec::new();

    for (index, header) in table.headers.iter().enumerate() {
        let mut name = header.trim();
        if name == WIND_SPEED_SYNONYM {
            name = Variable::WindSpeed.column();
        }
        if !seen.insert(name.to_string()) {
            debug!("Dropping duplicate column '{}' at position {}", name, index);
            continue;
        }
        if name == DATE_COLUMN {
            date_index = Some(index);
        } else if let Some(variable) = Variable::from_column(name) {
            variable_columns.push((index, variable));
        }
    }

    let date_index = date_index.ok_or_else(|| AppError::MissingColumn(DATE_COLUMN.to_string()))?;

    let mut observations = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;
    for (row_number, row) in table.rows.iter().enumerate().map(|(i, r)| (i + 1, r)) {
        let date = match row.get(date_index).unwrap_or(&Cell::Empty) {
            Cell::Empty => {
                skipped += 1;
                continue;
            },
            cell => parse_date(cell).ok_or_else(|| AppError::DateParse {
                row: row_number,
                value: describe_cell(cell),
            })?,
        };

        let values: BTreeMap<Variable, f64> = variable_columns
            .iter()
            .filter_map(|&(index, variable)| {
                row.get(index)
                    .and_then(parse_value)
                    .map(|value| (variable, value))
            })
            .collect();

        observations.push(Observation::new(date, values));
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a date", skipped);
    }

    let variables = variable_columns.into_iter().map(|(_, v)| v).collect();
    Ok(Dataset::new(observations, variables))
}

/// Parses a date cell: Excel serial numbers or day-first text.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parses a numeric value cell. Non-numeric and non-finite cells are missing.
pub fn parse_value(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Text(text) => {
            let text = text.trim();
            let parsed = text.parse::<f64>().ok();
            match parsed {
                Some(v) => v,
                // Decimal comma ("27,5")
                None if !text.contains('.') => text.replacen(',', ".", 1).parse::<f64>().ok()?,
                None => return None,
            }
        },
    };
    value.is_finite().then_some(value)
}

fn describe_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Number(n) => n.to_string(),
        Cell::Text(t) => t.clone(),
    }
}
