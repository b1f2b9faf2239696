//! Error types for dataset loading and filtering

use std::path::PathBuf;

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data file not found at {0}. Please check the file path.")]
    NotFound(PathBuf),

    #[error("Required column '{0}' is missing from the dataset")]
    MissingColumn(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Error loading data: {0}")]
    Read(#[from] PolarsError),
}

pub type DataResult<T> = std::result::Result<T, DataError>;
