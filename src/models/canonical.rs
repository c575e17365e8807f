//! Canonical per-respondent records
//!
//! A canonical record is the harmonized form of one respondent row from one
//! survey year: stable flag names, a decoded age bucket, and the resolved
//! analysis weight. Records are produced by the `YearRecoder` and consumed
//! read-only by the aggregator and by persistence collaborators.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::types::{AgeGroup, FlagUse};

/// One harmonized respondent row for one survey year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Survey year the respondent belongs to
    pub year: u16,
    /// Respondent identifier, unique within the year
    pub respondent_id: u64,
    /// Decoded age bucket; `None` when the age code was unmapped
    pub age_group: Option<AgeGroup>,
    /// Resolved survey analysis weight; always present and non-negative
    /// (records without a resolvable weight are dropped, never zero-weighted)
    pub analysis_weight: f64,
    /// Canonical flag values for this respondent.
    ///
    /// A flag with no resolvable source variable this year has no entry at
    /// all; a flag that was asked but not answered holds `FlagUse::Missing`.
    pub flags: FxHashMap<String, FlagUse>,
}

impl CanonicalRecord {
    /// Value of a canonical flag, if the flag was resolvable this year
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<FlagUse> {
        self.flags.get(name).copied()
    }
}
