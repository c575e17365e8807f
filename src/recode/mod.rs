//! Year recoding: raw extracts to canonical records
//!
//! One recoder invocation transforms one survey year's record batches into
//! canonical records, using the variable registry to resolve this year's
//! source variables and the weight selector to pick the analysis weight.
//! Invocations share no mutable state, so years recode independently in
//! parallel.

pub mod columns;

use std::collections::{BTreeMap, HashSet};

use arrow::array::{Array, Float64Array};
use arrow::record_batch::RecordBatch;
use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::{AgeGroup, CanonicalRecord, FlagUse};
use crate::recode::columns::numeric_column;
use crate::registry::VariableRegistry;
use crate::registry::weights::select_weight_variable;

/// Age-category variable, coded consistently across all survey years
pub const AGE_VARIABLE: &str = "CATAGE";

/// Result of recoding one survey year
#[derive(Debug)]
pub struct YearRecodeOutput {
    /// The recoded survey year
    pub year: u16,
    /// Weight variable chosen for the year
    pub weight_variable: &'static str,
    /// Canonical records, one per respondent with a resolvable weight
    pub records: Vec<CanonicalRecord>,
    /// Per canonical flag, the source variables that fed it this year, in
    /// precedence order. Flags with no entry were absent for the whole year.
    pub flag_sources: BTreeMap<String, Vec<String>>,
    /// Respondents dropped because their weight was null, NaN, or negative
    pub dropped_records: usize,
}

/// Recoder for a single survey year's raw record batches
#[derive(Debug)]
pub struct YearRecoder<'a> {
    registry: &'a VariableRegistry,
}

impl<'a> YearRecoder<'a> {
    /// Create a recoder backed by a validated variable registry
    #[must_use]
    pub const fn new(registry: &'a VariableRegistry) -> Self {
        Self { registry }
    }

    /// Recode one year of raw record batches into canonical records.
    ///
    /// The only fatal condition is an unresolvable weight variable; every
    /// other gap (unmapped age code, absent flag source, all-missing
    /// contributors) degrades to a missing value for that record or that
    /// (year, flag) pair.
    pub fn recode(&self, year: u16, batches: &[RecordBatch]) -> Result<YearRecodeOutput> {
        let available = column_union(batches);
        let weight_variable = select_weight_variable(year, &available)?;

        let flag_sources = self.resolve_flag_sources(year, &available);
        if flag_sources.is_empty() {
            warn!("{year}: no canonical flag has a resolvable source variable");
        }

        let mut records = Vec::new();
        let mut dropped_records = 0usize;
        let mut respondent_id = 0u64;

        for batch in batches {
            let Some(weights) = numeric_column(batch, weight_variable)? else {
                // The weight column exists somewhere this year but not in
                // this batch; those respondents cannot be weighted.
                warn!(
                    "{year}: batch lacks weight column {weight_variable}, dropping {} records",
                    batch.num_rows()
                );
                dropped_records += batch.num_rows();
                respondent_id += batch.num_rows() as u64;
                continue;
            };
            let ages = numeric_column(batch, AGE_VARIABLE)?;

            let mut flag_columns: Vec<(&str, Vec<Float64Array>)> = Vec::new();
            for (canonical, sources) in &flag_sources {
                let mut arrays = Vec::new();
                for source in sources {
                    if let Some(array) = numeric_column(batch, source)? {
                        arrays.push(array);
                    }
                }
                flag_columns.push((canonical.as_str(), arrays));
            }

            for row in 0..batch.num_rows() {
                let id = respondent_id;
                respondent_id += 1;

                if weights.is_null(row) {
                    dropped_records += 1;
                    continue;
                }
                let analysis_weight = weights.value(row);
                if !analysis_weight.is_finite() || analysis_weight < 0.0 {
                    dropped_records += 1;
                    continue;
                }

                let age_group = ages.as_ref().and_then(|codes| {
                    if codes.is_null(row) {
                        None
                    } else {
                        AgeGroup::from_code(codes.value(row).round() as i64)
                    }
                });

                let mut flags =
                    FxHashMap::with_capacity_and_hasher(flag_columns.len(), Default::default());
                for (canonical, arrays) in &flag_columns {
                    let mut value = FlagUse::Missing;
                    for array in arrays {
                        let contribution = if array.is_null(row) {
                            FlagUse::Missing
                        } else {
                            FlagUse::from_raw(array.value(row))
                        };
                        value = value.combine(contribution);
                    }
                    flags.insert((*canonical).to_string(), value);
                }

                records.push(CanonicalRecord {
                    year,
                    respondent_id: id,
                    age_group,
                    analysis_weight,
                    flags,
                });
            }
        }

        info!(
            "{year}: recoded {} records ({} dropped) with weight {weight_variable} and {} flags",
            records.len(),
            dropped_records,
            flag_sources.len()
        );

        Ok(YearRecodeOutput {
            year,
            weight_variable,
            records,
            flag_sources,
            dropped_records,
        })
    }

    /// Which canonical flags have at least one source variable present this
    /// year, and which source variables those are
    fn resolve_flag_sources(
        &self,
        year: u16,
        available: &HashSet<String>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut resolved = BTreeMap::new();
        for canonical in self.registry.canonical_names() {
            let present: Vec<String> = self
                .registry
                .sources_for(year, canonical)
                .into_iter()
                .filter(|source| available.contains(*source))
                .map(ToString::to_string)
                .collect();
            if !present.is_empty() {
                resolved.insert(canonical.to_string(), present);
            }
        }
        resolved
    }
}

/// Union of column names across a year's batches
fn column_union(batches: &[RecordBatch]) -> HashSet<String> {
    batches
        .iter()
        .flat_map(|batch| {
            batch
                .schema()
                .fields()
                .iter()
                .map(|field| field.name().clone())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarmonizeError;
    use crate::registry::VariableMapping;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn registry() -> VariableRegistry {
        VariableRegistry::new(vec![
            VariableMapping::new(2002, "ECSTMOFLAG", "ecstasy", 1),
            VariableMapping::new(2002, "ECSFLAG", "ecstasy", 1),
            VariableMapping::new(2002, "MRJFLAG", "marijuana", 2),
            VariableMapping::new(2002, "HERFLAG", "heroin", 3),
        ])
        .unwrap()
    }

    fn batch(columns: Vec<(&str, Vec<Option<f64>>)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Float64, true))
            .collect();
        let arrays: Vec<Arc<dyn Array>> = columns
            .into_iter()
            .map(|(_, values)| Arc::new(Float64Array::from(values)) as Arc<dyn Array>)
            .collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    #[test]
    fn rollup_ors_sources_and_keeps_missing_only_when_all_missing() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        let batch = batch(vec![
            ("ANALWT_C", vec![Some(100.0), Some(100.0), Some(100.0)]),
            ("CATAGE", vec![Some(2.0), Some(2.0), Some(2.0)]),
            ("ECSTMOFLAG", vec![Some(1.0), None, Some(0.0)]),
            ("ECSFLAG", vec![None, None, Some(1.0)]),
        ]);

        let output = recoder.recode(2002, &[batch]).unwrap();
        assert_eq!(output.records.len(), 3);
        // A=used, B=missing -> used
        assert_eq!(output.records[0].flag("ecstasy"), Some(FlagUse::Used));
        // A=missing, B=missing -> missing
        assert_eq!(output.records[1].flag("ecstasy"), Some(FlagUse::Missing));
        // A=not-used, B=used -> used
        assert_eq!(output.records[2].flag("ecstasy"), Some(FlagUse::Used));
    }

    #[test]
    fn unresolvable_weights_drop_records_not_zero_weight_them() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        let batch = batch(vec![
            ("ANALWT_C", vec![Some(250.0), None, Some(-1.0), Some(f64::NAN)]),
            ("CATAGE", vec![Some(1.0); 4]),
            ("MRJFLAG", vec![Some(1.0); 4]),
        ]);

        let output = recoder.recode(2002, &[batch]).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.dropped_records, 3);
        assert_eq!(output.records[0].analysis_weight, 250.0);
    }

    #[test]
    fn year_without_weight_column_fails_recoding() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        let batch = batch(vec![
            ("CATAGE", vec![Some(1.0)]),
            ("MRJFLAG", vec![Some(1.0)]),
        ]);

        let err = recoder.recode(2002, &[batch]).unwrap_err();
        assert!(matches!(
            err,
            HarmonizeError::NoWeightVariable { year: 2002, .. }
        ));
    }

    #[test]
    fn flags_without_sources_are_absent_not_false() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        // No heroin column this year: the flag must have no entry at all.
        let batch = batch(vec![
            ("ANALWT_C", vec![Some(100.0)]),
            ("CATAGE", vec![Some(3.0)]),
            ("MRJFLAG", vec![Some(0.0)]),
        ]);

        let output = recoder.recode(2002, &[batch]).unwrap();
        assert_eq!(output.records[0].flag("heroin"), None);
        assert_eq!(output.records[0].flag("marijuana"), Some(FlagUse::NotUsed));
        assert!(!output.flag_sources.contains_key("heroin"));
        assert_eq!(
            output.flag_sources.get("marijuana"),
            Some(&vec!["MRJFLAG".to_string()])
        );
    }

    #[test]
    fn unmapped_age_codes_become_missing_never_a_default_bucket() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        let batch = batch(vec![
            ("ANALWT_C", vec![Some(100.0), Some(100.0), Some(100.0)]),
            ("CATAGE", vec![Some(4.0), Some(9.0), None]),
            ("MRJFLAG", vec![Some(1.0), Some(1.0), Some(1.0)]),
        ]);

        let output = recoder.recode(2002, &[batch]).unwrap();
        assert_eq!(output.records[0].age_group, Some(AgeGroup::Age35Plus));
        assert_eq!(output.records[1].age_group, None);
        assert_eq!(output.records[2].age_group, None);
    }

    #[test]
    fn respondent_ids_are_unique_across_batches() {
        let registry = registry();
        let recoder = YearRecoder::new(&registry);
        let first = batch(vec![
            ("ANALWT_C", vec![Some(100.0), Some(100.0)]),
            ("MRJFLAG", vec![Some(1.0), Some(0.0)]),
        ]);
        let second = batch(vec![
            ("ANALWT_C", vec![Some(100.0)]),
            ("MRJFLAG", vec![Some(1.0)]),
        ]);

        let output = recoder.recode(2002, &[first, second]).unwrap();
        let ids: Vec<u64> = output.records.iter().map(|r| r.respondent_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
