//! The filter → aggregate → train → predict pipeline.
//!
//! Each user interaction re-runs `run` from the top over the cached dataset;
//! nothing computed here outlives a single run.

mod aggregate;
mod bank;
mod filter;
mod grid;

#[cfg(test)]
mod pipeline_test;

pub use bank::*;
pub use filter::*;
pub use grid::*;

use crate::config::ModelSettings;
use crate::error::{AppError, Result};
use crate::ml::Regressor;
use crate::models::{Dataset, MonthlyAggregate, Summary, Variable};
use indicatif::ProgressBar;
use tracing::info;

/// Everything the presentation layer needs from one pipeline run.
pub struct PipelineOutput {
    pub summary: Summary,
    pub monthly: Vec<MonthlyAggregate>,
    pub bank: ModelBank,
    pub grid: FutureGrid,
}

impl PipelineOutput {
    /// `(date, value)` pairs of one variable's monthly history, sorted by date.
    pub fn history(&self, variable: Variable) -> Vec<(chrono::NaiveDate, f64)> {
        let mut series: Vec<_> = self
            .monthly
            .iter()
            .filter_map(|row| row.value(variable).map(|v| (row.date, v)))
            .collect();
        series.sort_by_key(|(date, _)| *date);
        series
    }
}

/// Fails when the dataset has none of the recognized variable columns.
pub fn require_variables(dataset: &Dataset) -> Result<()> {
    if dataset.variables.is_empty() {
        return Err(AppError::NoRecognizedVariables {
            expected: Variable::expected_columns(),
        });
    }
    Ok(())
}

/// Runs the full pipeline for one filter selection.
pub fn run(
    dataset: &Dataset,
    selection: &FilterSelection,
    settings: &ModelSettings,
    regressor: &dyn Regressor,
    progress: &ProgressBar,
) -> Result<PipelineOutput> {
    require_variables(dataset)?;

    let filtered = filter::apply(dataset, selection);
    info!(
        "Filter kept {} of {} daily rows ({} years, {} months selected)",
        filtered.len(),
        dataset.observations.len(),
        selection.years.len(),
        selection.months.len()
    );

    let summary = Summary::from_observations(filtered.iter().copied(), dataset.variables.len());
    let monthly = aggregate::monthly(&filtered, &dataset.variables);
    let bank = ModelBank::train(&monthly, &dataset.variables, settings, regressor, progress);
    let grid = FutureGrid::predict(&bank);

    info!(
        "Pipeline finished: {} monthly rows, {} models trained, {} failed",
        monthly.len(),
        bank.trained_variables().len(),
        bank.failures().len()
    );

    Ok(PipelineOutput {
        summary,
        monthly,
        bank,
        grid,
    })
}
