//! Common domain type definitions
//!
//! This module contains the enum types shared across canonical records and
//! estimates: the harmonized age buckets and the three-state flag coding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Harmonized respondent age bucket.
///
/// Built from the CATAGE variable, which is coded consistently across all
/// survey years (1=12-17, 2=18-25, 3=26-34, 4=35+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    /// Ages 12 to 17
    Age12To17,
    /// Ages 18 to 25
    Age18To25,
    /// Ages 26 to 34
    Age26To34,
    /// Ages 35 and older
    Age35Plus,
}

impl AgeGroup {
    /// Map a CATAGE code to an age bucket.
    ///
    /// Unrecognized codes map to `None`, never to a default bucket.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Age12To17),
            2 => Some(Self::Age18To25),
            3 => Some(Self::Age26To34),
            4 => Some(Self::Age35Plus),
            _ => None,
        }
    }

    /// The CATAGE code for this bucket
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Age12To17 => 1,
            Self::Age18To25 => 2,
            Self::Age26To34 => 3,
            Self::Age35Plus => 4,
        }
    }

    /// Human-readable bucket label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Age12To17 => "12-17",
            Self::Age18To25 => "18-25",
            Self::Age26To34 => "26-34",
            Self::Age35Plus => "35+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-state lifetime-use coding for a canonical flag.
///
/// "Not used" and "missing" are distinct states: conflating them would
/// silently count "not asked" respondents into the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagUse {
    /// Respondent reported ever using
    Used,
    /// Respondent reported never using
    NotUsed,
    /// No usable response (skip pattern, refusal, bad data, or not asked)
    Missing,
}

impl FlagUse {
    /// Decode a raw flag value.
    ///
    /// Flag variables code 1 for lifetime use and 0 (recoded years) or 2
    /// (legacy years) for no use. Everything else is a missing sentinel
    /// (85 bad data, 94 don't know, 97 refused, 98 blank, ...).
    #[must_use]
    pub fn from_raw(value: f64) -> Self {
        if !value.is_finite() {
            return Self::Missing;
        }
        // Codes are whole numbers; tolerate float storage from Stata extracts.
        match value.round() as i64 {
            1 => Self::Used,
            0 | 2 => Self::NotUsed,
            _ => Self::Missing,
        }
    }

    /// Combine two contributing source values for the same canonical flag.
    ///
    /// Rollup precedence: any explicit "used" wins; an explicit "not used"
    /// beats missing; the result is missing only when every contributor is.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Used, _) | (_, Self::Used) => Self::Used,
            (Self::NotUsed, _) | (_, Self::NotUsed) => Self::NotUsed,
            (Self::Missing, Self::Missing) => Self::Missing,
        }
    }

    /// Whether this value carries information (is not missing)
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_group_codes_round_trip() {
        for code in 1..=4 {
            let group = AgeGroup::from_code(code).unwrap();
            assert_eq!(group.code(), code);
        }
    }

    #[test]
    fn unrecognized_age_codes_are_missing() {
        assert_eq!(AgeGroup::from_code(0), None);
        assert_eq!(AgeGroup::from_code(5), None);
        assert_eq!(AgeGroup::from_code(-9), None);
        assert_eq!(AgeGroup::from_code(85), None);
    }

    #[test]
    fn flag_decoding_handles_legacy_and_sentinel_codes() {
        assert_eq!(FlagUse::from_raw(1.0), FlagUse::Used);
        assert_eq!(FlagUse::from_raw(0.0), FlagUse::NotUsed);
        assert_eq!(FlagUse::from_raw(2.0), FlagUse::NotUsed);
        assert_eq!(FlagUse::from_raw(85.0), FlagUse::Missing);
        assert_eq!(FlagUse::from_raw(94.0), FlagUse::Missing);
        assert_eq!(FlagUse::from_raw(97.0), FlagUse::Missing);
        assert_eq!(FlagUse::from_raw(98.0), FlagUse::Missing);
        assert_eq!(FlagUse::from_raw(f64::NAN), FlagUse::Missing);
    }

    #[test]
    fn rollup_combination_truth_table() {
        use FlagUse::{Missing, NotUsed, Used};
        // Any explicit "yes" wins over missing from another contributor.
        assert_eq!(Used.combine(Missing), Used);
        assert_eq!(Missing.combine(Used), Used);
        assert_eq!(NotUsed.combine(Used), Used);
        assert_eq!(NotUsed.combine(Missing), NotUsed);
        assert_eq!(Missing.combine(NotUsed), NotUsed);
        assert_eq!(Missing.combine(Missing), Missing);
    }
}
