//! Domain models for harmonized survey data
//!
//! This module contains the canonical record and estimate types exchanged
//! between the recoder, the aggregator, and external collaborators.

pub mod canonical;
pub mod estimate;
pub mod types;

pub use canonical::CanonicalRecord;
pub use estimate::{AggregateEstimate, TrendPoint, TrendSeries};
pub use types::{AgeGroup, FlagUse};
