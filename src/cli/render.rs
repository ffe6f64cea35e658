//! Terminal rendering: summary cards, yearly sparkline charts and metric tables.

use crate::models::{ForecastMetrics, Summary, Variable};
use crate::pipeline::ModelBank;
use chrono::{Datelike, NaiveDate};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use std::collections::BTreeMap;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// The three headline counters.
pub fn summary_cards(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Historical Rows", "Year Range", "Climate Variables"]);
    table.add_row(vec![
        Cell::new(summary.rows).set_alignment(CellAlignment::Center),
        Cell::new(summary.year_range()).set_alignment(CellAlignment::Center),
        Cell::new(summary.variable_count).set_alignment(CellAlignment::Center),
    ]);
    table
}

/// Renders a monthly series as one row per year with a sparkline of its months.
///
/// Sparkline heights share one scale across all years so rows are comparable.
pub fn series_chart(series: &[(NaiveDate, f64)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Year", "Jan ─────── Dec", "Min", "Mean", "Max"]);

    let lo = series.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let hi = series.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for (date, value) in series {
        let slots = years.entry(date.year()).or_insert([None; 12]);
        slots[date.month0() as usize] = Some(*value);
    }

    for (year, slots) in years {
        let present: Vec<f64> = slots.iter().flatten().copied().collect();
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        table.add_row(vec![
            Cell::new(year),
            Cell::new(sparkline(&slots, lo, hi)),
            Cell::new(format!("{:.2}", min)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", mean)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", max)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// One block character per slot, scaled between `lo` and `hi`; gaps are spaces.
pub fn sparkline(values: &[Option<f64>], lo: f64, hi: f64) -> String {
    let span = hi - lo;
    values
        .iter()
        .map(|value| match value {
            None => ' ',
            Some(_) if !(span > 0.0) => SPARK_LEVELS[SPARK_LEVELS.len() / 2],
            Some(v) => {
                let scaled = ((v - lo) / span * (SPARK_LEVELS.len() - 1) as f64).round();
                SPARK_LEVELS[(scaled.max(0.0) as usize).min(SPARK_LEVELS.len() - 1)]
            },
        })
        .collect()
}

/// One metrics entry, either a trained model's scores or the failure reason.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsEntry {
    pub variable: Variable,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ForecastMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collects trained and failed variables into one list, in canonical order.
pub fn metrics_report(bank: &ModelBank) -> Vec<MetricsEntry> {
    let mut entries: Vec<MetricsEntry> = bank
        .metrics()
        .map(|(variable, metrics)| MetricsEntry {
            variable,
            label: variable.label(),
            metrics: Some(metrics.clone()),
            error: None,
        })
        .chain(bank.failures().iter().map(|(variable, e)| MetricsEntry {
            variable: *variable,
            label: variable.label(),
            metrics: None,
            error: Some(e.to_string()),
        }))
        .collect();
    entries.sort_by_key(|e| e.variable);
    entries
}

pub fn metrics_table(report: &[MetricsEntry]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Variable", "RMSE", "R²", "Train", "Test", "Status"]);
    for entry in report {
        match (&entry.metrics, &entry.error) {
            (Some(m), _) => table.add_row(vec![
                Cell::new(entry.label),
                Cell::new(format!("{:.4}", m.rmse)).set_alignment(CellAlignment::Right),
                Cell::new(m.r2.map_or("n/a".to_string(), |r| format!("{:.4}", r)))
                    .set_alignment(CellAlignment::Right),
                Cell::new(m.train_rows).set_alignment(CellAlignment::Right),
                Cell::new(m.test_rows).set_alignment(CellAlignment::Right),
                Cell::new("ok"),
            ]),
            (None, error) => table.add_row(vec![
                Cell::new(entry.label),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(error.as_deref().unwrap_or("failed")),
            ]),
        };
    }
    table
}

pub fn print_summary(summary: &Summary) {
    println!("{}", "Climate Data Overview".cyan().bold());
    println!("{}", summary_cards(summary));
}

pub fn print_history(variable: Variable, series: &[(NaiveDate, f64)]) {
    println!(
        "{} {}",
        "Historical Trend:".cyan().bold(),
        variable.label().bold()
    );
    if series.is_empty() {
        println!("{}", "No monthly data for the current selection.".yellow());
        return;
    }
    println!("{}", series_chart(series));
}

pub fn print_forecast(variable: Variable, series: &[(NaiveDate, f64)], failure: Option<String>) {
    println!(
        "{} {}",
        "Forecast 2025-2075:".cyan().bold(),
        variable.label().bold()
    );
    if series.is_empty() {
        let reason = failure.unwrap_or_else(|| "model not trained".to_string());
        println!("{} {}", "No forecast available:".yellow(), reason);
        return;
    }
    println!("{}", series_chart(series));
}

pub fn print_metrics(report: &[MetricsEntry]) {
    println!("{}", "Model Evaluation (20% hold-out)".cyan().bold());
    println!("{}", metrics_table(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSettings;
    use crate::ml::RandomForestRegressor;
    use crate::models::MonthlyAggregate;
    use indicatif::ProgressBar;

    #[test]
    fn sparkline_scales_and_leaves_gaps() {
        let line = sparkline(&[Some(0.0), None, Some(7.0), Some(3.5)], 0.0, 7.0);
        let chars: Vec<char> = line.chars().collect();
        assert_eq!(chars, vec!['▁', ' ', '█', '▅']);
    }

    #[test]
    fn flat_series_uses_middle_level() {
        assert_eq!(sparkline(&[Some(2.0), Some(2.0)], 2.0, 2.0), "▅▅");
    }

    #[test]
    fn chart_has_one_row_per_year() {
        let series: Vec<(NaiveDate, f64)> = (2020..=2022)
            .flat_map(|y| (1..=12).map(move |m| (NaiveDate::from_ymd_opt(y, m, 1).unwrap(), m as f64)))
            .collect();
        let table = series_chart(&series);
        assert_eq!(table.row_iter().count(), 3);
    }

    #[test]
    fn summary_cards_show_range() {
        let summary = Summary {
            rows: 1234,
            first_year: Some(2001),
            last_year: Some(2024),
            variable_count: 8,
        };
        let rendered = summary_cards(&summary).to_string();
        assert!(rendered.contains("1234"));
        assert!(rendered.contains("2001 - 2024"));
    }

    #[test]
    fn report_lists_trained_and_failed_variables_in_order() {
        let monthly: Vec<MonthlyAggregate> = (1..=12)
            .map(|m| MonthlyAggregate {
                year: 2020,
                month: m,
                date: NaiveDate::from_ymd_opt(2020, m, 1).unwrap(),
                values: BTreeMap::from([(Variable::AvgTemperature, 26.0 + m as f64 / 10.0)]),
            })
            .collect();
        let settings = ModelSettings {
            n_estimators: 5,
            ..ModelSettings::default()
        };
        let bank = ModelBank::train(
            &monthly,
            &[Variable::MinTemperature, Variable::AvgTemperature],
            &settings,
            &RandomForestRegressor::from_settings(&settings),
            &ProgressBar::hidden(),
        );

        let report = metrics_report(&bank);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].variable, Variable::MinTemperature);
        assert!(report[0].error.is_some());
        assert_eq!(report[1].metrics.as_ref().map(|m| m.test_rows), Some(3));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[1]["variable"], "Tavg");
        assert!(json[0].get("metrics").is_none());
    }
}
