//! Harmonization pipeline for working with multiple survey years
//!
//! This module provides the high-level interface that sequences the core:
//! per-year recoding (fanned out with rayon, one independent task per year),
//! concatenation of canonical records, weighted aggregation, and the
//! traceability report saying which flags each year carried and which years
//! were excluded and why.

use std::collections::HashSet;

use arrow::record_batch::RecordBatch;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::config::AggregationConfig;
use crate::error::{HarmonizeError, Result};
use crate::models::{AggregateEstimate, CanonicalRecord};
use crate::recode::{YearRecodeOutput, YearRecoder};
use crate::registry::VariableRegistry;
use crate::registry::weights::select_weight_variable;
use crate::segments::SegmentTable;

/// Per-year raw data provider.
///
/// The collaborator behind this trait owns fetching and parsing the original
/// yearly extracts; the pipeline only ever sees in-memory record batches and
/// the per-year column capability set.
pub trait YearDataSource {
    /// Survey years this source can provide
    fn years(&self) -> Vec<u16>;

    /// Column names available in a year's extract
    fn available_columns(&self, year: u16) -> Result<HashSet<String>>;

    /// The year's raw records as Arrow batches
    fn record_batches(&self, year: u16) -> Result<Vec<RecordBatch>>;
}

/// Why a year contributed no canonical records or estimates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearExclusion {
    /// The curated segment table marks the year unusable
    MethodologyExclusion {
        /// Label of the unusable segment
        segment_label: String,
    },
    /// No recognized analysis-weight column in the year's extract
    WeightResolutionFailure {
        /// Rendered weight-resolution error
        message: String,
    },
    /// The year falls outside the segment table's supported range
    OutsideSupportedRange,
}

/// Availability of one canonical flag in one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagAvailability {
    /// Canonical flag name
    pub canonical_name: String,
    /// Source variables that fed the flag, in precedence order
    pub source_names: Vec<String>,
    /// Concordance code of the flag this year, when the registry has one
    pub comparability_code: Option<i32>,
}

/// Traceability summary for one successfully recoded year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    /// The survey year
    pub year: u16,
    /// Canonical records emitted
    pub record_count: usize,
    /// Records dropped for unresolvable weights
    pub dropped_records: usize,
    /// Weight variable the selector chose
    pub weight_variable: String,
    /// Comparability segment the year belongs to
    pub segment_label: String,
    /// Canonical flags resolvable this year, with their sources
    pub available_flags: Vec<FlagAvailability>,
    /// Canonical flags with no source variable this year
    pub absent_flags: Vec<String>,
}

/// Per-run traceability report.
///
/// Being able to say, per year, which flags existed and which years were
/// excluded and why is the reason this pipeline exists; a silent gap here
/// becomes a confidently wrong trend line downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonizationReport {
    /// Summaries of recoded years, in year order
    pub years: Vec<YearSummary>,
    /// Excluded years and the reason for each, in year order
    pub excluded: Vec<(u16, YearExclusion)>,
}

impl HarmonizationReport {
    /// Render a human-readable run summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Harmonization Summary:\n");
        out.push_str(&format!("  Years recoded: {}\n", self.years.len()));
        for year in &self.years {
            out.push_str(&format!(
                "  {}: {} records ({} dropped), weight {}, {} flags, segment {}\n",
                year.year,
                year.record_count,
                year.dropped_records,
                year.weight_variable,
                year.available_flags.len(),
                year.segment_label
            ));
        }
        out.push_str(&format!("  Years excluded: {}\n", self.excluded.len()));
        for (year, reason) in &self.excluded {
            let reason = match reason {
                YearExclusion::MethodologyExclusion { segment_label } => {
                    format!("methodology exclusion ({segment_label})")
                }
                YearExclusion::WeightResolutionFailure { message } => {
                    format!("weight resolution failure: {message}")
                }
                YearExclusion::OutsideSupportedRange => "outside supported year range".to_string(),
            };
            out.push_str(&format!("  {year}: {reason}\n"));
        }
        out
    }
}

/// Everything a pipeline run produces
#[derive(Debug)]
pub struct HarmonizationResult {
    /// Merged canonical records across all recoded years, in year order
    pub records: Vec<CanonicalRecord>,
    /// Weighted estimates, annotated with comparability segments
    pub estimates: Vec<AggregateEstimate>,
    /// Per-year traceability report
    pub report: HarmonizationReport,
}

/// High-level driver over registry, segmenter, recoder, and aggregator
#[derive(Debug)]
pub struct HarmonizationPipeline {
    registry: VariableRegistry,
    segments: SegmentTable,
    config: AggregationConfig,
}

impl HarmonizationPipeline {
    /// Create a pipeline from validated reference data
    #[must_use]
    pub fn new(
        registry: VariableRegistry,
        segments: SegmentTable,
        config: AggregationConfig,
    ) -> Self {
        Self {
            registry,
            segments,
            config,
        }
    }

    /// The variable registry backing this pipeline
    #[must_use]
    pub const fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// The comparability segment table backing this pipeline
    #[must_use]
    pub const fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    /// Run the full pipeline over every year the source provides.
    ///
    /// Years in unusable segments are never recoded; a year that fails
    /// weight resolution is excluded and reported, not silently absorbed.
    /// Any other error is fatal for the whole run.
    pub fn run<S, F>(&self, source: &S, subgroup_fn: F) -> Result<HarmonizationResult>
    where
        S: YearDataSource + Sync,
        F: Fn(&CanonicalRecord) -> String + Sync,
    {
        let mut years = source.years();
        years.sort_unstable();
        years.dedup();
        info!("Harmonizing {} survey years", years.len());

        let mut excluded: Vec<(u16, YearExclusion)> = Vec::new();
        let mut usable_years: Vec<u16> = Vec::new();
        for year in years {
            match self.segments.segment_for(year) {
                None => {
                    warn!("{year}: outside supported year range, excluding");
                    excluded.push((year, YearExclusion::OutsideSupportedRange));
                }
                Some(segment) if !segment.usable => {
                    info!("{year}: excluded by methodology ({})", segment.label);
                    excluded.push((
                        year,
                        YearExclusion::MethodologyExclusion {
                            segment_label: segment.label.clone(),
                        },
                    ));
                }
                Some(_) => usable_years.push(year),
            }
        }

        // One independent task per year; results merged by concatenation.
        let recoded: Vec<(u16, Result<YearRecodeOutput>)> = usable_years
            .par_iter()
            .map(|&year| (year, self.recode_year(source, year)))
            .collect();

        let mut outputs: Vec<YearRecodeOutput> = Vec::new();
        for (year, result) in recoded {
            match result {
                Ok(output) => outputs.push(output),
                Err(err @ HarmonizeError::NoWeightVariable { .. }) => {
                    warn!("{year}: {err}");
                    excluded.push((
                        year,
                        YearExclusion::WeightResolutionFailure {
                            message: err.to_string(),
                        },
                    ));
                }
                Err(err) => return Err(err),
            }
        }
        outputs.sort_by_key(|output| output.year);
        excluded.sort_by_key(|(year, _)| *year);

        let report = self.build_report(&outputs, excluded);

        let mut records = Vec::new();
        for output in outputs {
            records.extend(output.records);
        }

        let estimates = aggregate(&records, &self.segments, &self.config, subgroup_fn);
        info!(
            "Harmonization produced {} canonical records and {} estimates",
            records.len(),
            estimates.len()
        );

        Ok(HarmonizationResult {
            records,
            estimates,
            report,
        })
    }

    fn recode_year<S: YearDataSource>(&self, source: &S, year: u16) -> Result<YearRecodeOutput> {
        // Resolve the weight variable from the capability query first, so a
        // year that cannot be weighted fails before its batches are fetched.
        let columns = source.available_columns(year)?;
        select_weight_variable(year, &columns)?;

        let batches = source.record_batches(year)?;
        YearRecoder::new(&self.registry).recode(year, &batches)
    }

    fn build_report(
        &self,
        outputs: &[YearRecodeOutput],
        excluded: Vec<(u16, YearExclusion)>,
    ) -> HarmonizationReport {
        let years = outputs
            .iter()
            .map(|output| {
                let available_flags = output
                    .flag_sources
                    .iter()
                    .map(|(canonical, sources)| FlagAvailability {
                        canonical_name: canonical.clone(),
                        source_names: sources.clone(),
                        comparability_code: self
                            .registry
                            .comparability_code(output.year, canonical),
                    })
                    .collect();
                let absent_flags = self
                    .registry
                    .canonical_names()
                    .filter(|name| !output.flag_sources.contains_key(*name))
                    .map(ToString::to_string)
                    .collect();
                let segment_label = self
                    .segments
                    .segment_for(output.year)
                    .map_or_else(String::new, |segment| segment.label.clone());

                YearSummary {
                    year: output.year,
                    record_count: output.records.len(),
                    dropped_records: output.dropped_records,
                    weight_variable: output.weight_variable.to_string(),
                    segment_label,
                    available_flags,
                    absent_flags,
                }
            })
            .collect();

        HarmonizationReport { years, excluded }
    }
}
