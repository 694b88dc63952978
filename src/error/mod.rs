//! Fatal error taxonomy.
//!
//! Anything in [`AppError`] aborts the run before (or instead of) processing
//! rows. Per-row failures never surface here; they are recorded as row
//! outcomes by the campaign pipeline.

use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing transport configuration: {0}")]
    MissingTransport(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to read input {path}: {message}")]
    Input { path: String, message: String },

    #[error("Result log error: {0}")]
    ResultLog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
