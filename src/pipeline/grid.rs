//! The fixed 2025–2075 monthly prediction grid.

use crate::ml::FeatureRow;
use crate::models::{month_start, Variable};
use crate::pipeline::ModelBank;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const FORECAST_START_YEAR: i32 = 2025;
pub const FORECAST_END_YEAR: i32 = 2075;

/// Every (year, month) from January 2025 through December 2075, in order.
pub fn future_grid() -> Vec<(i32, u32)> {
    (FORECAST_START_YEAR..=FORECAST_END_YEAR)
        .flat_map(|year| (1..=12).map(move |month| (year, month)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FutureRow {
    pub year: i32,
    pub month: u32,
    pub date: NaiveDate,
    pub predictions: BTreeMap<Variable, f64>,
}

impl FutureRow {
    pub fn prediction(&self, variable: Variable) -> Option<f64> {
        self.predictions.get(&variable).copied()
    }
}

/// The future grid with one predicted column per trained variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FutureGrid {
    pub rows: Vec<FutureRow>,
    /// Variables that have a prediction column, in canonical order.
    pub variables: Vec<Variable>,
}

impl FutureGrid {
    /// Applies every trained model in `bank` to the grid.
    pub fn predict(bank: &ModelBank) -> Self {
        let keys: Vec<(i32, u32)> = future_grid();
        let features: Vec<FeatureRow> = keys
            .iter()
            .map(|&(year, month)| [year as f64, month as f64])
            .collect();

        let variables = bank.trained_variables();
        let columns: Vec<(Variable, Vec<f64>)> = variables
            .iter()
            .filter_map(|&v| bank.get(v).map(|t| (v, t.model.predict(&features))))
            .collect();

        let rows = keys
            .iter()
            .enumerate()
            .filter_map(|(i, &(year, month))| {
                Some(FutureRow {
                    year,
                    month,
                    date: month_start(year, month)?,
                    predictions: columns.iter().map(|(v, values)| (*v, values[i])).collect(),
                })
            })
            .collect();

        Self { rows, variables }
    }

    /// `(date, value)` pairs of one predicted column.
    pub fn series(&self, variable: Variable) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.prediction(variable).map(|v| (r.date, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_fifty_one_years() {
        let grid = future_grid();
        assert_eq!(grid.len(), 51 * 12);
        assert_eq!(grid.first(), Some(&(2025, 1)));
        assert_eq!(grid.last(), Some(&(2075, 12)));
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_bank_gives_grid_without_predictions() {
        let grid = FutureGrid::predict(&ModelBank::default());
        assert_eq!(grid.rows.len(), 612);
        assert!(grid.variables.is_empty());
        assert!(grid.rows.iter().all(|r| r.predictions.is_empty()));
        assert!(grid.series(Variable::Rainfall).is_empty());
    }
}
