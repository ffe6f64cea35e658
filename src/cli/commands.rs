use crate::cli::render;
use crate::config::Settings;
use crate::data::{CachedSource, SpreadsheetSource};
use crate::error::{AppError, Result};
use crate::export;
use crate::ml::RandomForestRegressor;
use crate::models::{Dataset, Variable, WIND_SPEED_SYNONYM};
use crate::pipeline::{self, FilterSelection, PipelineOutput};
use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// CLI tool for regional climate data exploration and forecasting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input workbook or CSV file (overrides CLIMATE_DATA_PATH)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Worksheet holding the daily records (overrides CLIMATE_SHEET)
    #[arg(long, global = true)]
    pub sheet: Option<String>,

    /// Region code used in the export file name (overrides CLIMATE_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Run a single command; without one an interactive session starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Applies command line overrides on top of environment settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(region) = &self.region {
            settings.region = region.clone();
            if self.data.is_none() && std::env::var("CLIMATE_DATA_PATH").is_err() {
                settings.data_path = PathBuf::from(format!("{}.xlsx", region));
            }
        }
        if let Some(data) = &self.data {
            settings.data_path = data.clone();
        }
        if let Some(sheet) = &self.sheet {
            settings.sheet = sheet.clone();
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show row count, year range and number of climate variables
    Summary(ReportArgs),

    /// Chart the monthly history of one variable
    History(ChartArgs),

    /// Chart the 2025-2075 forecast of one variable
    Forecast(ChartArgs),

    /// Show hold-out RMSE and R² of every variable's model
    Metrics(ReportArgs),

    /// Write the 2025-2075 forecast grid to a CSV file
    Export(ExportArgs),
}

/// Year/month selection shared by all commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Years to include, comma separated (default: all years in the data)
    #[arg(long, value_delimiter = ',')]
    pub years: Option<Vec<i32>>,

    /// Months to include (1-12), comma separated (default: all months)
    #[arg(long, value_delimiter = ',')]
    pub months: Option<Vec<u32>>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChartArgs {
    /// Variable column name (Tn, Tx, Tavg, kelembaban, curah_hujan, matahari, FF_X, DDD_X)
    #[arg(short, long)]
    pub variable: String,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output file (default: <CLIMATE_OUTPUT_DIR>/prediksi_<REGION>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// CLI application
pub struct App {
    settings: Settings,
    source: CachedSource<SpreadsheetSource>,
    regressor: RandomForestRegressor,
}

impl App {
    /// Create a new CLI application
    pub fn new(settings: Settings) -> Self {
        let source = CachedSource::new(SpreadsheetSource::new(
            settings.data_path.clone(),
            settings.sheet.clone(),
        ));
        let regressor = RandomForestRegressor::from_settings(&settings.model);
        Self {
            settings,
            source,
            regressor,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The dataset, read from disk on first use only.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        if !self.source.is_loaded() {
            info!("Reading daily observations from {}", self.source.describe());
        }
        self.source.get()
    }

    /// Re-runs filter → aggregate → train → predict for `selection`.
    pub fn refresh(&self, selection: &FilterSelection, show_progress: bool) -> Result<PipelineOutput> {
        let dataset = self.dataset()?;
        let progress = if show_progress {
            training_progress()?
        } else {
            ProgressBar::hidden()
        };
        pipeline::run(
            &dataset,
            selection,
            &self.settings.model,
            &self.regressor,
            &progress,
        )
    }

    /// Run a single non-interactive command
    pub fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Summary(args) => {
                let output = self.run_filtered(&args.filter, !args.json)?;
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&output.summary)?);
                } else {
                    render::print_summary(&output.summary);
                }
            },
            Commands::History(args) => {
                let dataset = self.dataset()?;
                let variable = parse_variable(&args.variable, &dataset)?;
                let output = self.run_filtered(&args.filter, true)?;
                render::print_history(variable, &output.history(variable));
            },
            Commands::Forecast(args) => {
                let dataset = self.dataset()?;
                let variable = parse_variable(&args.variable, &dataset)?;
                let output = self.run_filtered(&args.filter, true)?;
                show_forecast(&output, variable);
            },
            Commands::Metrics(args) => {
                let output = self.run_filtered(&args.filter, !args.json)?;
                let report = render::metrics_report(&output.bank);
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    render::print_metrics(&report);
                }
            },
            Commands::Export(args) => {
                let output = self.run_filtered(&args.filter, true)?;
                let path = args.output.unwrap_or_else(|| self.settings.export_path());
                self.export(&output, &path)?;
            },
        }

        Ok(())
    }

    /// Writes the forecast grid of `output` to `path` and reports it.
    pub fn export(&self, output: &PipelineOutput, path: &std::path::Path) -> Result<()> {
        export::save_forecast(&output.grid, path)?;
        println!(
            "{} {} ({} rows, {} predicted variables)",
            "Forecast saved to".green(),
            path.display(),
            output.grid.rows.len(),
            output.grid.variables.len()
        );
        Ok(())
    }

    fn run_filtered(&self, filter: &FilterArgs, show_progress: bool) -> Result<PipelineOutput> {
        let dataset = self.dataset()?;
        let selection =
            FilterSelection::from_lists(&dataset, filter.years.as_deref(), filter.months.as_deref())?;
        info!(
            "Running pipeline on {} for years {:?} and months {:?}",
            self.source.describe(),
            selection.years,
            selection.months
        );
        self.refresh(&selection, show_progress)
    }
}

/// Prints the forecast chart of `variable`, or why there is none.
pub fn show_forecast(output: &PipelineOutput, variable: Variable) {
    let failure = output
        .bank
        .failures()
        .get(&variable)
        .map(|e| e.to_string());
    render::print_forecast(variable, &output.grid.series(variable), failure);
}

/// Resolves a user-supplied variable name against the loaded dataset.
///
/// Matching is case-insensitive on the column name; the wind speed synonym
/// is accepted as well.
pub fn parse_variable(name: &str, dataset: &Dataset) -> Result<Variable> {
    let wanted = name.trim();
    let variable = if wanted.eq_ignore_ascii_case(WIND_SPEED_SYNONYM) {
        Some(Variable::WindSpeed)
    } else {
        Variable::ALL
            .into_iter()
            .find(|v| v.column().eq_ignore_ascii_case(wanted))
    };

    match variable {
        Some(v) if dataset.has_variable(v) => Ok(v),
        _ => Err(AppError::UnknownVariable(format!(
            "{} (available: {})",
            wanted,
            dataset
                .variables
                .iter()
                .map(|v| v.column())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn training_progress() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} Training {msg:<12} [{bar:30.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}
