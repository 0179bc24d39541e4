//! Error types for workbook building, reading and splitting

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by this crate
///
/// Validation failures (`EmptySheetName`, `InvalidSheetName`, `UnknownColumn`,
/// `InvalidStyleTarget`, `InvalidColor`, `InvalidColumnWidth`,
/// `InvalidGradientRotation`, `InvalidChunkSize`) are raised before any file
/// is created.
#[derive(Debug, Error)]
pub enum ExcelError {
    /// Sheet name is blank
    #[error("Sheet name must not be empty")]
    EmptySheetName,

    /// Sheet name breaks the XLSX naming rules
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    /// A column referenced by totals, typing, formats, widths or styles is not in the header
    #[error("Unknown column '{column}' referenced in {context}")]
    UnknownColumn { column: String, context: String },

    /// A value in a numeric column could not be parsed
    #[error("Invalid numeric value '{value}' in column '{column}' at row {row}")]
    InvalidNumericValue {
        row: usize,
        column: String,
        value: String,
    },

    /// A style key that is neither `COL`, `COL:*` nor `COL:<row>`
    #[error("Invalid style target '{0}'")]
    InvalidStyleTarget(String),

    /// A color that is not 6 or 8 hex digits
    #[error("Invalid color '{0}', expected RGB or ARGB hex digits")]
    InvalidColor(String),

    /// Column width outside what spreadsheet applications accept
    #[error("Invalid width {width} for column '{column}': expected 0 to 255")]
    InvalidColumnWidth { column: String, width: f64 },

    /// Gradient fill rotation that is not a finite angle
    #[error("Invalid gradient rotation {0}")]
    InvalidGradientRotation(f64),

    /// The destination could not be created
    #[error("Unable to initialize output file {}: {reason}", path.display())]
    OutputInitializationFailed { path: PathBuf, reason: String },

    /// No sheet name given for a workbook with several sheets
    #[error("Workbook has {} sheets ({sheets:?}); a sheet name is required", sheets.len())]
    AmbiguousSheetReference { sheets: Vec<String> },

    /// Split requested with a zero row bound
    #[error("Invalid chunk size {0}: at least one row per file is required")]
    InvalidChunkSize(usize),

    /// Sheet lookup by name or index failed
    #[error("Sheet {0} not found")]
    SheetNotFound(String),

    /// Failure while reading a workbook
    #[error("Read error: {0}")]
    ReadError(String),

    /// Failure while writing a workbook
    #[error("Write error: {0}")]
    WriteError(String),

    /// Operation called in the wrong order
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExcelError {
    pub(crate) fn unknown_column(column: &str, context: &str) -> Self {
        ExcelError::UnknownColumn {
            column: column.to_string(),
            context: context.to_string(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ExcelError>;
