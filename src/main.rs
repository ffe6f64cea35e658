mod cli;
mod config;
mod data;
mod error;
mod export;
mod ml;
mod models;
mod pipeline;

use anyhow::Context;
use clap::Parser;
use cli::{prompts, render, App, Cli};
use colored::*;
use config::{LogFormat, Settings};
use dialoguer::{theme::ColorfulTheme, Select};
use pipeline::FilterSelection;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "climate-forecast.log";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            // No settings to configure the subscriber from, so log to stderr
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(None))
                .with_writer(std::io::stderr)
                .init();
            error!("Failed to read configuration: {:?}", e);
            return Err(anyhow::Error::new(e).context("Failed to read configuration"));
        },
    };
    cli.apply_overrides(&mut settings);

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&settings);
    debug!("Resolved settings: {:?}", settings);
    info!("Starting climate forecast for region {}", settings.region);

    let app = App::new(settings);

    match cli.command {
        Some(command) => app.run_command(command).map_err(|e| {
            error!("Command execution failed: {:?}", e);
            e
        })?,
        None => interactive(&app)?,
    }

    Ok(())
}

/// Sets up the tracing subscriber.
///
/// Logs go to a non-rolling file under `log_dir` when configured, otherwise to
/// stderr (quieter by default so they do not interleave with the prompts).
fn init_logging(settings: &Settings) -> Option<WorkerGuard> {
    let filter = env_filter(settings.log_dir.as_deref());

    match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            match settings.log_format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Text => builder.init(),
            }
            Some(guard)
        },
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            match settings.log_format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Text => builder.init(),
            }
            None
        },
    }
}

/// Default directive for our own crate, used when `RUST_LOG` is unset.
fn default_directive(log_dir: Option<&Path>) -> &'static str {
    match log_dir {
        Some(_) => "climate_forecast=info",
        None => "climate_forecast=warn",
    }
}

fn env_filter(log_dir: Option<&Path>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(log_dir)))
}

/// Interactive session: pick filters and views from a menu until exit.
fn interactive(app: &App) -> anyhow::Result<()> {
    println!(
        "{}",
        "Welcome to the Climate Analysis & Forecast CLI!".cyan().bold()
    );

    let dataset = app
        .dataset()
        .with_context(|| format!("Failed to load {}", app.settings().data_path.display()))?;

    if let Err(e) = pipeline::require_variables(&dataset) {
        println!("{} {}", "Error:".red().bold(), e.to_string().red());
        return Err(e.into());
    }

    let mut selection = FilterSelection::all(&dataset);
    let mut output = app.refresh(&selection, true)?;
    render::print_summary(&output.summary);

    loop {
        let options = &[
            "Select Years",
            "Select Months",
            "Show Summary",
            "Historical Trend Chart",
            "Forecast Chart 2025-2075",
            "Model Metrics",
            "Export Forecast CSV",
            "Exit",
        ];

        let selected = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()? // Ctrl+C / Esc
            .unwrap_or(options.len() - 1); // Default to Exit if cancelled

        println!("\n---\n");

        let mut filter_changed = false;
        let command_result: error::Result<()> = match selected {
            0 => prompts::prompt_years(&dataset.years(), &selection.years).map(|chosen| {
                if let Some(years) = chosen {
                    filter_changed = years != selection.years;
                    selection.years = years;
                }
            }),
            1 => prompts::prompt_months(&selection.months).map(|chosen| {
                if let Some(months) = chosen {
                    filter_changed = months != selection.months;
                    selection.months = months;
                }
            }),
            2 => {
                render::print_summary(&output.summary);
                Ok(())
            },
            3 => prompts::prompt_variable("Select variable", &dataset.variables).map(|chosen| {
                if let Some(variable) = chosen {
                    render::print_history(variable, &output.history(variable));
                }
            }),
            4 => prompts::prompt_variable("Select forecast variable", &dataset.variables).map(
                |chosen| {
                    if let Some(variable) = chosen {
                        cli::show_forecast(&output, variable);
                    }
                },
            ),
            5 => {
                render::print_metrics(&render::metrics_report(&output.bank));
                Ok(())
            },
            6 => {
                let default = app.settings().export_path();
                prompts::prompt_export_path(&default.to_string_lossy())
                    .and_then(|path| app.export(&output, Path::new(&path)))
            },
            7 => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            _ => unreachable!(),
        };

        if filter_changed {
            match app.refresh(&selection, true) {
                Ok(refreshed) => {
                    output = refreshed;
                    render::print_summary(&output.summary);
                },
                Err(e) => {
                    error!("Pipeline re-run failed: {:?}", e);
                    println!("{} {}", "Error re-running pipeline:".red(), e.to_string().red());
                },
            }
        }

        // Handle potential errors from command execution
        if let Err(e) = command_result {
            error!("Command execution failed: {:?}", e);
            println!(
                "{} {}",
                "Error executing command:".red(),
                e.to_string().red()
            );
        }

        println!("\n---\n");
    }

    Ok(())
}
