//! Aggregated estimate types
//!
//! Output rows of the weighted aggregation pass, plus the per-segment trend
//! series shape handed to plotting collaborators.

use serde::{Deserialize, Serialize};

/// One weighted prevalence estimate for a (year, flag, subgroup) cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEstimate {
    /// Survey year of the cell
    pub year: u16,
    /// Canonical flag name the estimate describes
    pub flag_name: String,
    /// Subgroup partition key (e.g. an age bucket label, or "all")
    pub subgroup_key: String,
    /// Weighted lifetime-use prevalence, in percent (0..=100)
    pub weighted_pct: f64,
    /// Weighted count of respondents coded "used"
    pub weighted_n: f64,
    /// Unweighted count of valid (non-missing) respondents in the cell
    pub unweighted_n: usize,
    /// True when `unweighted_n` fell below the configured reliability floor;
    /// the cell is still emitted, suppression is the consumer's call
    pub unreliable: bool,
    /// Label of the comparability segment the year belongs to
    pub segment_label: String,
}

/// One plottable point of a trend series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Survey year
    pub year: u16,
    /// Weighted prevalence in percent
    pub weighted_pct: f64,
}

/// A run of estimates for one flag and subgroup within one comparability
/// segment.
///
/// A plotting layer draws exactly one polyline per series; segment
/// boundaries and the excluded year therefore can never be bridged by a
/// connecting line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Canonical flag name
    pub flag_name: String,
    /// Subgroup partition key
    pub subgroup_key: String,
    /// Comparability segment label shared by every point
    pub segment_label: String,
    /// Points sorted by year
    pub points: Vec<TrendPoint>,
}
