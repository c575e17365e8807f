//! Error handling for the harmonization pipeline.

use arrow::error::ArrowError;

/// Specialized error type for harmonization operations
#[derive(Debug, thiserror::Error)]
pub enum HarmonizeError {
    /// Reference data (variable registry or segment table) is internally inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No recognized analysis-weight column exists for a survey year.
    ///
    /// Fatal for that year only: the year is excluded from canonical records
    /// and estimates, and the exclusion is reported.
    #[error("No analysis weight variable found for {year} (available columns: {available:?})")]
    NoWeightVariable {
        /// The survey year that failed weight resolution
        year: u16,
        /// The column names that were actually available for the year
        available: Vec<String>,
    },

    /// A column holds a type that cannot be read as numeric survey codes
    #[error("Column '{column}' has unsupported type {data_type} for numeric recoding")]
    ColumnType {
        /// Name of the offending column
        column: String,
        /// The Arrow data type found
        data_type: String,
    },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Result type for harmonization operations
pub type Result<T> = std::result::Result<T, HarmonizeError>;
