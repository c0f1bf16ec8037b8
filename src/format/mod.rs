//! Output formats.
//!
//! Row-contract consumers of a flattened result, plus the aggregation
//! JSON that keeps the cell matrix shape:
//!
//! - [`csv`] - header row plus one line per tidy row
//! - [`records`] - `{"data": [{column: value}, ...]}`
//! - [`aggregation`] - axes, axis dimensions and nested values
//!
//! Formatters never reorder or alter rows.

pub mod aggregation;
pub mod csv;
pub mod records;

pub use aggregation::{aggregation, AggregationOutput};
pub use self::csv::to_csv;
pub use records::to_records;

use thiserror::Error;

use crate::engine::Cube;
use crate::error::QueryError;
use crate::result::{tidy, CellResult, TidyOptions};

/// Result type for formatting.
pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("buffer flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Csv,
    JsonRecords,
    #[default]
    Json,
}

impl Format {
    /// Parse a format name as callers spell it.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "jsonrecords" => Some(Self::JsonRecords),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::JsonRecords => "jsonrecords",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::JsonRecords | Self::Json => "application/json",
        }
    }
}

/// Render a result in the given format.
pub fn render(
    format: Format,
    result: &CellResult,
    cube: &Cube,
    options: &TidyOptions,
) -> FormatResult<String> {
    match format {
        Format::Csv => to_csv(&tidy(result, cube, options)?),
        Format::JsonRecords => to_records(&tidy(result, cube, options)?),
        Format::Json => Ok(serde_json::to_string(&aggregation(result, cube))?),
    }
}
