//! Defines the climate domain types.
//!
//! Includes:
//! - `Variable`: the eight tracked climate metrics and their column names.
//! - `Observation` / `Dataset`: daily records after loading and normalization.
//! - `MonthlyAggregate`: one (year, month) summary row.
//! - `ForecastMetrics` / `Summary`: results structured for CLI output.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the date column in the input file.
pub const DATE_COLUMN: &str = "Tanggal";

/// Column synonym renamed on load (wind speed).
pub const WIND_SPEED_SYNONYM: &str = "kecepatan_angin";

/// Column names written for the year and month keys.
pub const YEAR_COLUMN: &str = "Tahun";
pub const MONTH_COLUMN: &str = "Bulan";

/// A tracked climate metric.
///
/// The declaration order is the canonical column order used everywhere
/// (model training, export columns, menus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Variable {
    /// Minimum daily temperature (`Tn`).
    #[serde(rename = "Tn")]
    MinTemperature,
    /// Maximum daily temperature (`Tx`).
    #[serde(rename = "Tx")]
    MaxTemperature,
    /// Average daily temperature (`Tavg`).
    #[serde(rename = "Tavg")]
    AvgTemperature,
    /// Relative humidity (`kelembaban`).
    #[serde(rename = "kelembaban")]
    Humidity,
    /// Daily rainfall (`curah_hujan`).
    #[serde(rename = "curah_hujan")]
    Rainfall,
    /// Sunshine duration (`matahari`).
    #[serde(rename = "matahari")]
    Sunshine,
    /// Maximum wind speed (`FF_X`).
    #[serde(rename = "FF_X")]
    WindSpeed,
    /// Wind direction at maximum speed (`DDD_X`).
    #[serde(rename = "DDD_X")]
    WindDirection,
}

impl Variable {
    pub const ALL: [Variable; 8] = [
        Variable::MinTemperature,
        Variable::MaxTemperature,
        Variable::AvgTemperature,
        Variable::Humidity,
        Variable::Rainfall,
        Variable::Sunshine,
        Variable::WindSpeed,
        Variable::WindDirection,
    ];

    /// Column name of this variable in the input file.
    pub fn column(self) -> &'static str {
        match self {
            Variable::MinTemperature => "Tn",
            Variable::MaxTemperature => "Tx",
            Variable::AvgTemperature => "Tavg",
            Variable::Humidity => "kelembaban",
            Variable::Rainfall => "curah_hujan",
            Variable::Sunshine => "matahari",
            Variable::WindSpeed => "FF_X",
            Variable::WindDirection => "DDD_X",
        }
    }

    /// Human readable label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Variable::MinTemperature => "Minimum Temperature (°C)",
            Variable::MaxTemperature => "Maximum Temperature (°C)",
            Variable::AvgTemperature => "Average Temperature (°C)",
            Variable::Humidity => "Humidity (%)",
            Variable::Rainfall => "Rainfall (mm)",
            Variable::Sunshine => "Sunshine Duration (hours)",
            Variable::WindSpeed => "Wind Speed (m/s)",
            Variable::WindDirection => "Wind Direction (°)",
        }
    }

    /// Looks up a variable by its exact column name.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.column() == name)
    }

    /// Name of the forecast column for this variable (`Pred_<column>`).
    pub fn prediction_column(self) -> String {
        format!("Pred_{}", self.column())
    }

    /// Rainfall is accumulated over the month; everything else is averaged.
    pub fn is_summed(self) -> bool {
        matches!(self, Variable::Rainfall)
    }

    /// All recognized column names, in canonical order.
    pub fn expected_columns() -> Vec<String> {
        Self::ALL.iter().map(|v| v.column().to_string()).collect()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One calendar day of observations.
///
/// Only variables with a usable value on that day appear in `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub values: BTreeMap<Variable, f64>,
}

impl Observation {
    /// Creates an observation, deriving year and month from the date.
    pub fn new(date: NaiveDate, values: BTreeMap<Variable, f64>) -> Self {
        use chrono::Datelike;
        Self {
            date,
            year: date.year(),
            month: date.month(),
            values,
        }
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        self.values.get(&variable).copied()
    }
}

/// The daily records of one region dataset together with the variables
/// whose columns were present in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    /// Available variables, in canonical order.
    pub variables: Vec<Variable>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>, mut variables: Vec<Variable>) -> Self {
        variables.sort();
        variables.dedup();
        Self {
            observations,
            variables,
        }
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.observations.iter().map(|o| o.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn has_variable(&self, variable: Variable) -> bool {
        self.variables.contains(&variable)
    }
}

/// One (year, month) row of aggregated values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    /// First day of the month, used as the chart x-axis.
    pub date: NaiveDate,
    /// Aggregated value per variable; absent when no day had a value
    /// (averaged variables only).
    pub values: BTreeMap<Variable, f64>,
}

impl MonthlyAggregate {
    pub fn value(&self, variable: Variable) -> Option<f64> {
        self.values.get(&variable).copied()
    }
}

/// Hold-out evaluation of one trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    pub rmse: f64,
    /// Coefficient of determination; `None` with fewer than two hold-out rows.
    pub r2: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Headline counters of the currently filtered data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub variable_count: usize,
}

impl Summary {
    pub fn from_observations<'a>(
        observations: impl IntoIterator<Item = &'a Observation>,
        variable_count: usize,
    ) -> Self {
        let mut summary = Self {
            rows: 0,
            first_year: None,
            last_year: None,
            variable_count,
        };
        for obs in observations {
            summary.rows += 1;
            summary.first_year = Some(summary.first_year.map_or(obs.year, |y| y.min(obs.year)));
            summary.last_year = Some(summary.last_year.map_or(obs.year, |y| y.max(obs.year)));
        }
        summary
    }

    /// Year range as displayed on the summary card.
    pub fn year_range(&self) -> String {
        match (self.first_year, self.last_year) {
            (Some(first), Some(last)) => format!("{} - {}", first, last),
            _ => "-".to_string(),
        }
    }
}

/// First day of the given month, if the pair is a valid calendar month.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tn", Some(Variable::MinTemperature))]
    #[case("curah_hujan", Some(Variable::Rainfall))]
    #[case("FF_X", Some(Variable::WindSpeed))]
    #[case("kecepatan_angin", None)]
    #[case("tn", None)]
    fn variable_lookup_by_column(#[case] column: &str, #[case] expected: Option<Variable>) {
        assert_eq!(Variable::from_column(column), expected);
    }

    #[test]
    fn only_rainfall_is_summed() {
        let summed: Vec<Variable> = Variable::ALL.into_iter().filter(|v| v.is_summed()).collect();
        assert_eq!(summed, vec![Variable::Rainfall]);
    }

    #[test]
    fn prediction_column_uses_source_name() {
        assert_eq!(Variable::AvgTemperature.prediction_column(), "Pred_Tavg");
        assert_eq!(Variable::WindDirection.prediction_column(), "Pred_DDD_X");
    }

    #[test]
    fn observation_derives_year_and_month() {
        let date = NaiveDate::from_ymd_opt(2021, 7, 14).unwrap();
        let obs = Observation::new(date, BTreeMap::new());
        assert_eq!((obs.year, obs.month), (2021, 7));
    }

    #[test]
    fn summary_of_empty_set_has_no_year_range() {
        let summary = Summary::from_observations(Vec::<&Observation>::new(), 3);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.year_range(), "-");
        assert_eq!(summary.variable_count, 3);
    }

    #[test]
    fn dataset_orders_variables_canonically() {
        let ds = Dataset::new(
            Vec::new(),
            vec![Variable::Rainfall, Variable::MinTemperature, Variable::Rainfall],
        );
        assert_eq!(ds.variables, vec![Variable::MinTemperature, Variable::Rainfall]);
    }
}
