//! Defines the custom error types for the club-scout application.

use std::io;
use thiserror::Error;

/// The primary error type for the lead collection process.
///
/// Network and markup problems on individual pages never show up here: those
/// degrade to absent values at the fetch boundary. Only problems that make a
/// whole run meaningless are surfaced.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// The league listing URL was not supplied.
    #[error("Missing Input: {0}")]
    MissingInput(String),

    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error building the HTTP client.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// Error writing the exported lead sheet.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;
