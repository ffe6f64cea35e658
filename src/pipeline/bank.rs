//! One independently trained forecast model per climate variable.

use crate::config::ModelSettings;
use crate::error::{AppError, Result};
use crate::ml::{r2_score, rmse, train_test_split, FeatureRow, FittedModel, Regressor};
use crate::models::{ForecastMetrics, MonthlyAggregate, Variable};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A fitted model together with its hold-out evaluation.
pub struct TrainedModel {
    pub model: Box<dyn FittedModel>,
    pub metrics: ForecastMetrics,
}

/// Trained models keyed by variable, plus the variables that could not be trained.
#[derive(Default)]
pub struct ModelBank {
    trained: BTreeMap<Variable, TrainedModel>,
    failures: BTreeMap<Variable, AppError>,
}

impl ModelBank {
    /// Trains one model per variable on the monthly aggregates.
    ///
    /// A variable that fails (too little data, backend error) is recorded in
    /// `failures` and does not stop the others.
    pub fn train(
        monthly: &[MonthlyAggregate],
        variables: &[Variable],
        settings: &ModelSettings,
        regressor: &dyn Regressor,
        progress: &ProgressBar,
    ) -> Self {
        info!(
            "Training {} models ({}, {} estimators) on {} monthly rows",
            variables.len(),
            regressor.name(),
            settings.n_estimators,
            monthly.len()
        );
        progress.set_length(variables.len() as u64);

        let mut bank = Self::default();
        for &variable in variables {
            progress.set_message(variable.column());
            match train_variable(monthly, variable, settings, regressor) {
                Ok(trained) => {
                    debug!(
                        "{}: rmse={:.4} r2={:?}",
                        variable, trained.metrics.rmse, trained.metrics.r2
                    );
                    bank.trained.insert(variable, trained);
                },
                Err(e) => {
                    warn!("Skipping forecast for {}: {}", variable, e);
                    bank.failures.insert(variable, e);
                },
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        bank
    }

    pub fn get(&self, variable: Variable) -> Option<&TrainedModel> {
        self.trained.get(&variable)
    }

    /// Successfully trained variables, in canonical order.
    pub fn trained_variables(&self) -> Vec<Variable> {
        self.trained.keys().copied().collect()
    }

    pub fn metrics(&self) -> impl Iterator<Item = (Variable, &ForecastMetrics)> {
        self.trained.iter().map(|(v, t)| (*v, &t.metrics))
    }

    pub fn failures(&self) -> &BTreeMap<Variable, AppError> {
        &self.failures
    }
}

fn train_variable(
    monthly: &[MonthlyAggregate],
    variable: Variable,
    settings: &ModelSettings,
    regressor: &dyn Regressor,
) -> Result<TrainedModel> {
    let (features, target): (Vec<FeatureRow>, Vec<f64>) = monthly
        .iter()
        .filter_map(|row| {
            row.value(variable)
                .map(|value| ([row.year as f64, row.month as f64], value))
        })
        .unzip();

    if features.len() < settings.min_monthly_rows {
        return Err(AppError::InsufficientData {
            variable: variable.column().to_string(),
            rows: features.len(),
            required: settings.min_monthly_rows,
        });
    }

    let split = train_test_split(features.len(), settings.test_fraction, settings.seed)?;
    let pick = |indices: &[usize]| -> (Vec<FeatureRow>, Vec<f64>) {
        indices.iter().map(|&i| (features[i], target[i])).unzip()
    };
    let (x_train, y_train) = pick(&split.train);
    let (x_test, y_test) = pick(&split.test);

    let model = regressor.fit(&x_train, &y_train)?;
    let predicted = model.predict(&x_test);

    let metrics = ForecastMetrics {
        rmse: rmse(&y_test, &predicted)?,
        r2: r2_score(&y_test, &predicted)?,
        train_rows: y_train.len(),
        test_rows: y_test.len(),
    };
    Ok(TrainedModel { model, metrics })
}
