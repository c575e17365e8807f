//! Weighted aggregation of canonical records
//!
//! A single deterministic pass over the merged canonical record set,
//! producing one weighted prevalence estimate per (year, flag, subgroup)
//! cell. Cells in unusable comparability segments are never formed, empty
//! denominators are omitted rather than reported as zero, and thin cells
//! are tagged unreliable instead of suppressed.
//!
//! Partitions never share state, so large inputs fan out across threads
//! with a plain fold/reduce; results are sorted before return, making the
//! pass order-independent and idempotent.

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::AggregationConfig;
use crate::models::{AggregateEstimate, CanonicalRecord, FlagUse, TrendPoint, TrendSeries};
use crate::segments::SegmentTable;

/// Ready-made subgroup functions for the common partitions
pub mod subgroup {
    use crate::models::CanonicalRecord;

    /// Single partition over all respondents
    #[must_use]
    pub fn all(_record: &CanonicalRecord) -> String {
        "all".to_string()
    }

    /// Partition by harmonized age bucket; unmapped ages form their own key
    #[must_use]
    pub fn by_age_group(record: &CanonicalRecord) -> String {
        record
            .age_group
            .map_or_else(|| "unknown".to_string(), |group| group.as_str().to_string())
    }
}

type CellKey = (u16, String, String);

#[derive(Debug, Default, Clone, Copy)]
struct Cell {
    weighted_used: f64,
    weighted_total: f64,
    valid: usize,
}

/// Compute weighted prevalence estimates per (year, flag, subgroup) cell.
///
/// Records in years outside the segment table or inside an unusable segment
/// contribute nothing, so the explicitly excluded year yields zero rows by
/// construction. Output is sorted by (flag, subgroup, year).
pub fn aggregate<F>(
    records: &[CanonicalRecord],
    segments: &SegmentTable,
    config: &AggregationConfig,
    subgroup_fn: F,
) -> Vec<AggregateEstimate>
where
    F: Fn(&CanonicalRecord) -> String + Sync,
{
    let cells = if records.len() >= config.parallel_threshold {
        records
            .par_iter()
            .fold(FxHashMap::default, |map, record| {
                accumulate(map, record, segments, &subgroup_fn)
            })
            .reduce(FxHashMap::default, merge_cells)
    } else {
        records.iter().fold(FxHashMap::default(), |map, record| {
            accumulate(map, record, segments, &subgroup_fn)
        })
    };

    let mut estimates: Vec<AggregateEstimate> = cells
        .into_iter()
        .filter_map(|((year, flag_name, subgroup_key), cell)| {
            if cell.weighted_total <= 0.0 {
                // An empty denominator is a data gap, not a zero prevalence.
                debug!("Omitting empty cell ({year}, {flag_name}, {subgroup_key})");
                return None;
            }
            let segment_label = segments.segment_for(year)?.label.clone();
            Some(AggregateEstimate {
                year,
                flag_name,
                subgroup_key,
                weighted_pct: 100.0 * cell.weighted_used / cell.weighted_total,
                weighted_n: cell.weighted_used,
                unweighted_n: cell.valid,
                unreliable: cell.valid < config.reliability_floor,
                segment_label,
            })
        })
        .collect();

    estimates.sort_by(|a, b| {
        (a.flag_name.as_str(), a.subgroup_key.as_str(), a.year).cmp(&(
            b.flag_name.as_str(),
            b.subgroup_key.as_str(),
            b.year,
        ))
    });
    estimates
}

fn accumulate<F>(
    mut cells: FxHashMap<CellKey, Cell>,
    record: &CanonicalRecord,
    segments: &SegmentTable,
    subgroup_fn: &F,
) -> FxHashMap<CellKey, Cell>
where
    F: Fn(&CanonicalRecord) -> String + Sync,
{
    let Some(segment) = segments.segment_for(record.year) else {
        return cells;
    };
    if !segment.usable {
        return cells;
    }

    let subgroup_key = subgroup_fn(record);
    for (flag_name, value) in &record.flags {
        // Missing values stay out of both numerator and denominator.
        if !value.is_known() {
            continue;
        }
        let cell = cells
            .entry((record.year, flag_name.clone(), subgroup_key.clone()))
            .or_default();
        cell.weighted_total += record.analysis_weight;
        cell.valid += 1;
        if *value == FlagUse::Used {
            cell.weighted_used += record.analysis_weight;
        }
    }
    cells
}

fn merge_cells(
    mut left: FxHashMap<CellKey, Cell>,
    right: FxHashMap<CellKey, Cell>,
) -> FxHashMap<CellKey, Cell> {
    for (key, cell) in right {
        let merged = left.entry(key).or_default();
        merged.weighted_used += cell.weighted_used;
        merged.weighted_total += cell.weighted_total;
        merged.valid += cell.valid;
    }
    left
}

/// Group estimates into per-segment trend series for plotting.
///
/// One series per (flag, subgroup, segment label), points sorted by year. A
/// consumer that draws one polyline per series cannot connect points across
/// a methodology break or the excluded year.
#[must_use]
pub fn trend_series(estimates: &[AggregateEstimate]) -> Vec<TrendSeries> {
    let grouped = estimates
        .iter()
        .map(|estimate| {
            (
                (
                    estimate.flag_name.clone(),
                    estimate.subgroup_key.clone(),
                    estimate.segment_label.clone(),
                ),
                TrendPoint {
                    year: estimate.year,
                    weighted_pct: estimate.weighted_pct,
                },
            )
        })
        .into_group_map();

    let mut series: Vec<TrendSeries> = grouped
        .into_iter()
        .map(|((flag_name, subgroup_key, segment_label), mut points)| {
            points.sort_by_key(|point| point.year);
            TrendSeries {
                flag_name,
                subgroup_key,
                segment_label,
                points,
            }
        })
        .collect();

    series.sort_by(|a, b| {
        let a_start = a.points.first().map_or(0, |p| p.year);
        let b_start = b.points.first().map_or(0, |p| p.year);
        (a.flag_name.as_str(), a.subgroup_key.as_str(), a_start).cmp(&(
            b.flag_name.as_str(),
            b.subgroup_key.as_str(),
            b_start,
        ))
    });
    series
}
