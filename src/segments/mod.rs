//! Comparability segmentation of the survey year range
//!
//! Methodology redesigns (the 1999 incentive change, the 2002 PUF
//! re-harmonization, the 2021 multimode transition) break across-year
//! comparability at fixed, documented years. The segment table partitions
//! the supported year range into labeled runs; estimates may only be
//! compared, or connected by a trend line, within one usable segment.
//!
//! The table is curated reference data, validated once at construction and
//! total over the supported range: every year maps to exactly one segment
//! or to an explicitly unusable one, never to an implicit default.

use serde::{Deserialize, Serialize};

use crate::error::{HarmonizeError, Result};

/// A maximal run of methodologically comparable survey years
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparabilitySegment {
    /// First year of the segment (inclusive)
    pub start_year: u16,
    /// Last year of the segment (inclusive)
    pub end_year: u16,
    /// Label carried onto every estimate in the segment
    pub label: String,
    /// False marks a year range excluded from analysis regardless of
    /// position (e.g. the pandemic-disrupted collection year)
    pub usable: bool,
}

impl ComparabilitySegment {
    /// Build a usable segment over an inclusive year range
    #[must_use]
    pub fn new(start_year: u16, end_year: u16, label: &str) -> Self {
        Self {
            start_year,
            end_year,
            label: label.to_string(),
            usable: true,
        }
    }

    /// Build a segment whose years are excluded from analysis
    #[must_use]
    pub fn excluded(start_year: u16, end_year: u16, label: &str) -> Self {
        Self {
            usable: false,
            ..Self::new(start_year, end_year, label)
        }
    }

    /// Whether a year falls inside this segment
    #[must_use]
    pub const fn contains(&self, year: u16) -> bool {
        self.start_year <= year && year <= self.end_year
    }
}

/// Ordered break-year table partitioning the supported year range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTable {
    segments: Vec<ComparabilitySegment>,
}

impl SegmentTable {
    /// Build and validate a segment table.
    ///
    /// Fails with a configuration error on an empty table, an inverted
    /// range, or any gap or overlap between consecutive segments; a broken
    /// break-year table is wrong reference data, not something to paper
    /// over at query time.
    pub fn new(mut segments: Vec<ComparabilitySegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(HarmonizeError::Configuration(
                "Segment table must contain at least one segment".to_string(),
            ));
        }

        segments.sort_by_key(|s| s.start_year);

        for segment in &segments {
            if segment.start_year > segment.end_year {
                return Err(HarmonizeError::Configuration(format!(
                    "Segment '{}' has inverted year range {}-{}",
                    segment.label, segment.start_year, segment.end_year
                )));
            }
        }

        for pair in segments.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start_year <= prev.end_year {
                return Err(HarmonizeError::Configuration(format!(
                    "Segments '{}' and '{}' overlap at {}",
                    prev.label, next.label, next.start_year
                )));
            }
            if next.start_year != prev.end_year + 1 {
                return Err(HarmonizeError::Configuration(format!(
                    "Gap between segments '{}' and '{}': years {}-{} are unmapped",
                    prev.label,
                    next.label,
                    prev.end_year + 1,
                    next.start_year - 1
                )));
            }
        }

        Ok(Self { segments })
    }

    /// The curated NSDUH break-year table.
    ///
    /// 2020 is excluded outright: pandemic-disrupted collection made the
    /// year's estimates unusable regardless of methodology.
    #[must_use]
    pub fn nsduh() -> Self {
        Self::new(vec![
            ComparabilitySegment::new(1979, 1998, "1979-1998"),
            ComparabilitySegment::new(1999, 2001, "1999-2001"),
            ComparabilitySegment::new(2002, 2019, "2002-2019"),
            ComparabilitySegment::excluded(2020, 2020, "2020 (excluded)"),
            ComparabilitySegment::new(2021, 2024, "2021+"),
        ])
        .expect("curated NSDUH segment table is valid")
    }

    /// Segment a year belongs to, or `None` outside the supported range
    #[must_use]
    pub fn segment_for(&self, year: u16) -> Option<&ComparabilitySegment> {
        self.segments.iter().find(|s| s.contains(year))
    }

    /// Inclusive (first, last) year covered by the table
    #[must_use]
    pub fn supported_range(&self) -> (u16, u16) {
        // Validation guarantees a non-empty, sorted table.
        (
            self.segments[0].start_year,
            self.segments[self.segments.len() - 1].end_year,
        )
    }

    /// Two years are comparable when they share a usable segment
    #[must_use]
    pub fn comparable(&self, a: u16, b: u16) -> bool {
        match (self.segment_for(a), self.segment_for(b)) {
            (Some(sa), Some(sb)) => sa.usable && sb.usable && sa.label == sb.label,
            _ => false,
        }
    }

    /// The segments in year order
    pub fn segments(&self) -> impl Iterator<Item = &ComparabilitySegment> {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nsduh_table_is_total_over_supported_range() {
        let table = SegmentTable::nsduh();
        let (first, last) = table.supported_range();
        assert_eq!((first, last), (1979, 2024));
        for year in first..=last {
            let segment = table.segment_for(year);
            assert!(segment.is_some(), "year {year} is unmapped");
        }
        assert!(table.segment_for(1978).is_none());
        assert!(table.segment_for(2025).is_none());
    }

    #[test]
    fn segments_are_disjoint() {
        let table = SegmentTable::nsduh();
        let (first, last) = table.supported_range();
        for year in first..=last {
            let matching = table.segments().filter(|s| s.contains(year)).count();
            assert_eq!(matching, 1, "year {year} maps to {matching} segments");
        }
    }

    #[test]
    fn pandemic_year_is_marked_unusable() {
        let table = SegmentTable::nsduh();
        let segment = table.segment_for(2020).unwrap();
        assert!(!segment.usable);
        assert_eq!(segment.label, "2020 (excluded)");
    }

    #[test]
    fn comparability_requires_shared_usable_segment() {
        let table = SegmentTable::nsduh();
        assert!(table.comparable(2005, 2015));
        assert!(!table.comparable(2019, 2021));
        assert!(!table.comparable(1998, 1999));
        assert!(!table.comparable(2020, 2020));
        assert!(!table.comparable(2005, 2030));
    }

    #[test]
    fn gap_in_table_is_a_configuration_error() {
        let err = SegmentTable::new(vec![
            ComparabilitySegment::new(1979, 1998, "a"),
            ComparabilitySegment::new(2002, 2019, "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, HarmonizeError::Configuration(_)));
    }

    #[test]
    fn overlap_in_table_is_a_configuration_error() {
        let err = SegmentTable::new(vec![
            ComparabilitySegment::new(1979, 2001, "a"),
            ComparabilitySegment::new(1999, 2019, "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, HarmonizeError::Configuration(_)));
    }
}
