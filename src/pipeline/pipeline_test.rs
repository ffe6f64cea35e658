use crate::config::ModelSettings;
use crate::error::{AppError, Result};
use crate::ml::{FeatureRow, FittedModel, RandomForestRegressor, Regressor};
use crate::models::{Dataset, Observation, Variable};
use crate::pipeline::{run, FilterSelection, FutureGrid};
use chrono::NaiveDate;
use indicatif::ProgressBar;
use std::collections::BTreeMap;

fn settings() -> ModelSettings {
    ModelSettings {
        n_estimators: 20,
        ..ModelSettings::default()
    }
}

// Three readings a month for 2015-2020 with a seasonal temperature and
// rainfall signal. Humidity is only recorded in 2015.
fn synthetic_dataset() -> Dataset {
    let mut observations = Vec::new();
    for year in 2015..=2020 {
        for month in 1..=12u32 {
            for day in [1, 10, 20] {
                let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
                let mut values = BTreeMap::new();
                let season = (month as f64 / 12.0 * std::f64::consts::TAU).sin();
                values.insert(Variable::AvgTemperature, 27.0 + season + (year - 2015) as f64 * 0.05);
                values.insert(Variable::Rainfall, (10.0 + 8.0 * season).max(0.0) + day as f64 * 0.1);
                if year == 2015 && month <= 3 {
                    values.insert(Variable::Humidity, 80.0 + month as f64);
                }
                observations.push(Observation::new(date, values));
            }
        }
    }
    Dataset::new(
        observations,
        vec![Variable::AvgTemperature, Variable::Rainfall, Variable::Humidity],
    )
}

fn run_all(dataset: &Dataset, selection: &FilterSelection) -> crate::pipeline::PipelineOutput {
    let regressor = RandomForestRegressor::from_settings(&settings());
    run(dataset, selection, &settings(), &regressor, &ProgressBar::hidden()).unwrap()
}

#[test]
fn full_run_produces_monthly_rows_models_and_grid() {
    let ds = synthetic_dataset();
    let out = run_all(&ds, &FilterSelection::all(&ds));

    assert_eq!(out.summary.rows, 6 * 12 * 3);
    assert_eq!(out.summary.year_range(), "2015 - 2020");
    assert_eq!(out.summary.variable_count, 3);
    assert_eq!(out.monthly.len(), 72);

    assert_eq!(
        out.bank.trained_variables(),
        vec![Variable::AvgTemperature, Variable::Rainfall]
    );
    assert_eq!(out.grid.rows.len(), 612);
    assert_eq!(out.grid.series(Variable::AvgTemperature).len(), 612);
}

#[test]
fn sparse_variable_fails_alone() {
    let ds = synthetic_dataset();
    let out = run_all(&ds, &FilterSelection::all(&ds));

    match out.bank.failures().get(&Variable::Humidity) {
        Some(AppError::InsufficientData { rows, required, .. }) => {
            assert_eq!(*rows, 3);
            assert_eq!(*required, 5);
        },
        other => panic!("Expected InsufficientData for humidity, got {:?}", other),
    }
    assert!(out.grid.series(Variable::Humidity).is_empty());
    assert!(out.bank.get(Variable::Rainfall).is_some());
}

#[test]
fn rainfall_is_summed_per_month() {
    let ds = synthetic_dataset();
    let out = run_all(&ds, &FilterSelection::all(&ds));

    let january_2016: f64 = ds
        .observations
        .iter()
        .filter(|o| o.year == 2016 && o.month == 1)
        .filter_map(|o| o.value(Variable::Rainfall))
        .sum();
    let row = out
        .monthly
        .iter()
        .find(|r| r.year == 2016 && r.month == 1)
        .unwrap();
    assert!((row.value(Variable::Rainfall).unwrap() - january_2016).abs() < 1e-9);
}

#[test]
fn identical_runs_give_identical_predictions() {
    let ds = synthetic_dataset();
    let selection = FilterSelection::from_lists(&ds, Some(&[2016, 2017, 2018][..]), None).unwrap();
    let first = run_all(&ds, &selection);
    let second = run_all(&ds, &selection);

    assert_eq!(first.grid, second.grid);
    let a: Vec<_> = first.bank.metrics().map(|(v, m)| (v, m.clone())).collect();
    let b: Vec<_> = second.bank.metrics().map(|(v, m)| (v, m.clone())).collect();
    assert_eq!(a, b);
}

#[test]
fn filter_restricts_history_and_keeps_grid_size() {
    let ds = synthetic_dataset();
    let selection = FilterSelection::from_lists(&ds, Some(&[2019][..]), Some(&[6, 7, 8][..])).unwrap();
    let out = run_all(&ds, &selection);

    assert_eq!(out.summary.rows, 9);
    assert_eq!(out.monthly.len(), 3);
    assert!(out
        .monthly
        .iter()
        .all(|r| r.year == 2019 && (6..=8).contains(&r.month)));
    // Three monthly rows are below the minimum sample size.
    assert!(out.bank.trained_variables().is_empty());
    assert_eq!(out.grid.rows.len(), 612);
}

#[test]
fn empty_selection_does_not_crash() {
    let ds = synthetic_dataset();
    let selection = FilterSelection::from_lists(&ds, Some(&[][..]), None).unwrap();
    let out = run_all(&ds, &selection);

    assert_eq!(out.summary.rows, 0);
    assert_eq!(out.summary.year_range(), "-");
    assert!(out.monthly.is_empty());
    assert_eq!(out.bank.failures().len(), 3);
    assert_eq!(out.grid.rows.len(), 612);
    assert!(out.history(Variable::AvgTemperature).is_empty());
}

#[test]
fn dataset_without_variables_halts_before_training() {
    struct PanickingRegressor;
    impl Regressor for PanickingRegressor {
        fn fit(&self, _: &[FeatureRow], _: &[f64]) -> Result<Box<dyn FittedModel>> {
            panic!("training must not start");
        }
        fn name(&self) -> &str {
            "panicking"
        }
    }

    let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let ds = Dataset::new(vec![Observation::new(date, BTreeMap::new())], Vec::new());
    let err = run(
        &ds,
        &FilterSelection::all(&ds),
        &settings(),
        &PanickingRegressor,
        &ProgressBar::hidden(),
    )
    .err()
    .unwrap();

    match err {
        AppError::NoRecognizedVariables { expected } => {
            assert_eq!(expected.len(), 8);
            assert!(expected.contains(&"curah_hujan".to_string()));
        },
        other => panic!("Expected NoRecognizedVariables, got {:?}", other),
    }
}

#[test]
fn backend_failure_is_isolated_per_variable() {
    // Fails only on rainfall, the one variable with monthly values above 40.
    struct PickyRegressor;
    struct Constant(f64);
    impl FittedModel for Constant {
        fn predict(&self, features: &[FeatureRow]) -> Vec<f64> {
            vec![self.0; features.len()]
        }
    }
    impl Regressor for PickyRegressor {
        fn fit(&self, _: &[FeatureRow], target: &[f64]) -> Result<Box<dyn FittedModel>> {
            if target.iter().any(|v| *v > 40.0) {
                return Err(AppError::Model("refusing".into()));
            }
            Ok(Box::new(Constant(target[0])))
        }
        fn name(&self) -> &str {
            "picky"
        }
    }

    let ds = synthetic_dataset();
    let out = run(
        &ds,
        &FilterSelection::all(&ds),
        &settings(),
        &PickyRegressor,
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert!(matches!(
        out.bank.failures().get(&Variable::Rainfall),
        Some(AppError::Model(_))
    ));
    assert_eq!(out.bank.trained_variables(), vec![Variable::AvgTemperature]);
    assert_eq!(
        FutureGrid::predict(&out.bank).variables,
        vec![Variable::AvgTemperature]
    );
}

#[test]
fn history_is_sorted_by_date() {
    let ds = synthetic_dataset();
    let out = run_all(&ds, &FilterSelection::all(&ds));
    let history = out.history(Variable::AvgTemperature);
    assert_eq!(history.len(), 72);
    assert!(history.windows(2).all(|w| w[0].0 < w[1].0));
}
