//! Runtime configuration.
//!
//! Values come from a `.env` file (via `dotenv`) and the process environment,
//! and may then be overridden by command line flags.

use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_REGION: &str = "KEPRI";
pub const DEFAULT_SHEET: &str = "Data Harian - Table";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "CLIMATE_LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Hyperparameters of the per-variable forecast models.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Number of trees in each forest.
    pub n_estimators: usize,
    /// Seed shared by the hold-out split and the forest bootstrap.
    pub seed: u64,
    /// Fraction of monthly rows withheld for evaluation.
    pub test_fraction: f64,
    /// Minimum monthly rows with a value before a variable is trained.
    pub min_monthly_rows: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            n_estimators: 180,
            seed: 42,
            test_fraction: 0.2,
            min_monthly_rows: 5,
        }
    }
}

/// Application settings resolved at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub region: String,
    pub data_path: PathBuf,
    pub sheet: String,
    pub output_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub model: ModelSettings,
}

impl Settings {
    /// Reads settings from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let region = env::var("CLIMATE_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let data_path = env::var("CLIMATE_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(format!("{}.xlsx", region)));
        let sheet = env::var("CLIMATE_SHEET").unwrap_or_else(|_| DEFAULT_SHEET.to_string());
        let output_dir = env::var("CLIMATE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let log_dir = env::var("CLIMATE_LOG_DIR").ok().map(PathBuf::from);
        let log_format = match env::var("CLIMATE_LOG_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) => LogFormat::Text,
        };

        let mut model = ModelSettings::default();
        if let Some(trees) = parse_env::<usize>("CLIMATE_TREES")? {
            if trees == 0 {
                return Err(AppError::Config("CLIMATE_TREES must be positive".into()));
            }
            model.n_estimators = trees;
        }
        if let Some(seed) = parse_env::<u64>("CLIMATE_SEED")? {
            model.seed = seed;
        }

        Ok(Self {
            region,
            data_path,
            sheet,
            output_dir,
            log_dir,
            log_format,
            model,
        })
    }

    /// File name of the forecast export for the configured region.
    pub fn export_file_name(&self) -> String {
        format!("prediksi_{}.csv", self.region)
    }

    /// Default export location: output directory joined with the export file name.
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(self.export_file_name())
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 8] = [
        "CLIMATE_REGION",
        "CLIMATE_DATA_PATH",
        "CLIMATE_SHEET",
        "CLIMATE_OUTPUT_DIR",
        "CLIMATE_LOG_DIR",
        "CLIMATE_LOG_FORMAT",
        "CLIMATE_TREES",
        "CLIMATE_SEED",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_environment() {
        clear_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.region, "KEPRI");
        assert_eq!(settings.data_path, PathBuf::from("KEPRI.xlsx"));
        assert_eq!(settings.sheet, DEFAULT_SHEET);
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.model, ModelSettings::default());
        assert_eq!(settings.export_file_name(), "prediksi_KEPRI.csv");
    }

    #[test]
    #[serial]
    fn region_drives_default_paths() {
        clear_env();
        env::set_var("CLIMATE_REGION", "PAPUABARAT");
        env::set_var("CLIMATE_OUTPUT_DIR", "/tmp/out");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.data_path, PathBuf::from("PAPUABARAT.xlsx"));
        assert_eq!(
            settings.export_path(),
            PathBuf::from("/tmp/out/prediksi_PAPUABARAT.csv")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn model_overrides_are_parsed() {
        clear_env();
        env::set_var("CLIMATE_TREES", "25");
        env::set_var("CLIMATE_SEED", "7");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.model.n_estimators, 25);
        assert_eq!(settings.model.seed, 7);
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_numbers_are_config_errors() {
        clear_env();
        env::set_var("CLIMATE_TREES", "many");
        let err = Settings::from_env().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        clear_env();
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
