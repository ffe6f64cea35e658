//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error raised while opening or reading a workbook (`calamine`).
    #[error("Spreadsheet Error: {0}")]
    Spreadsheet(Arc<calamine::Error>),

    /// Error while reading or writing comma-separated data (`csv`).
    #[error("CSV Error: {0}")]
    Csv(Arc<csv::Error>),

    /// Error during JSON rendering (`serde_json`).
    #[error("JSON Error: {0}")]
    Json(Arc<serde_json::Error>),

    /// Invalid or inconsistent configuration value.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error specific to CLI logic or argument handling.
    #[error("CLI Error: {0}")]
    Cli(String),

    /// A required column is absent from the input table.
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// A date cell could not be interpreted as a calendar day.
    #[error("Unparseable date '{value}' in data row {row}")]
    DateParse { row: usize, value: String },

    /// None of the recognized climate variable columns exist in the input.
    #[error("No recognized climate variables found. Expected at least one of: {}", expected.join(", "))]
    NoRecognizedVariables { expected: Vec<String> },

    /// Too few monthly rows to split into training and hold-out sets.
    #[error("Not enough monthly data for '{variable}': {rows} rows, at least {required} required")]
    InsufficientData {
        variable: String,
        rows: usize,
        required: usize,
    },

    /// Failure inside a regression backend.
    #[error("Model Error: {0}")]
    Model(String),

    /// A variable name given by the user is not one of the tracked variables.
    #[error("Unknown or unavailable variable '{0}'")]
    UnknownVariable(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// These allow easy conversion from external error types into AppError
// using the `?` operator. Arc is used for non-Clone error types.

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        AppError::Spreadsheet(Arc::new(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}
