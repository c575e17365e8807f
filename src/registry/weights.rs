//! Analysis-weight variable selection
//!
//! Weight semantics differ by survey era: a single-mode weight before 2002,
//! the harmonized `ANALWT_C` for 2002-2019, and the mode-adjusted
//! `ANALWT2_C` from 2021 on, with legacy alternates in some early years.
//! Selection is therefore a fixed priority scan over the columns actually
//! present in a year's extract, never an inference from the year number.

use std::collections::HashSet;

use crate::error::{HarmonizeError, Result};

/// Weight variable names in selection priority order
pub const WEIGHT_PRIORITY: [&str; 4] = ["ANALWT_C", "ANALWT2_C", "ANALWT", "ANALWT2"];

/// Pick the analysis-weight variable for a year's column set.
///
/// The first priority name present in `available` wins. A year with no
/// recognized weight column fails recoding entirely; zero-weighting its
/// records would silently bias every denominator downstream.
pub fn select_weight_variable(year: u16, available: &HashSet<String>) -> Result<&'static str> {
    WEIGHT_PRIORITY
        .iter()
        .find(|name| available.contains(**name))
        .copied()
        .ok_or_else(|| {
            let mut columns: Vec<String> = available.iter().cloned().collect();
            columns.sort();
            HarmonizeError::NoWeightVariable {
                year,
                available: columns,
            }
        })
}
