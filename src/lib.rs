//! A Rust library for harmonizing yearly NSDUH survey extracts onto a
//! canonical schema and computing weighted, comparability-annotated
//! prevalence estimates.
//!
//! The core pieces, leaves first:
//! - `registry`: static (year, source variable) to canonical variable
//!   mapping, plus analysis-weight selection
//! - `recode`: per-year transformation of raw record batches into canonical
//!   respondent records
//! - `segments`: the curated break-year table partitioning the year range
//!   into comparability segments
//! - `aggregate`: weighted per-(year, flag, subgroup) estimates
//! - `pipeline`: the driver sequencing all of the above, with a per-year
//!   traceability report

pub mod aggregate;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod recode;
pub mod registry;
pub mod segments;

// Re-export the most common types for easier use
// Core types
pub use config::AggregationConfig;
pub use error::{HarmonizeError, Result};
pub use models::{AgeGroup, AggregateEstimate, CanonicalRecord, FlagUse, TrendPoint, TrendSeries};

// Reference data
pub use registry::{VariableMapping, VariableRegistry};
pub use segments::{ComparabilitySegment, SegmentTable};

// Recoding and aggregation
pub use aggregate::{aggregate, trend_series};
pub use recode::{YearRecodeOutput, YearRecoder};

// Pipeline orchestration
pub use pipeline::{
    HarmonizationPipeline, HarmonizationReport, HarmonizationResult, YearDataSource, YearExclusion,
    YearSummary,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;
