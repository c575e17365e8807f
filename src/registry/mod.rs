//! Variable registry for cross-year harmonization
//!
//! Each survey year names and codes its variables differently. The registry
//! is the static, externally curated mapping from a year's source variable
//! names to the stable canonical schema, together with the concordance
//! (comparability) code documenting how far back each variable is officially
//! harmonized.
//!
//! The registry is validated once at construction and immutable afterwards,
//! so per-year recoding workers can share it without locking.

pub mod nsduh;
pub mod weights;

use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{HarmonizeError, Result};

/// One row of the curated harmonization table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMapping {
    /// Survey year the source variable appears in
    pub year: u16,
    /// Variable name as it appears in the year's extract
    pub source_name: String,
    /// Stable canonical name the source variable feeds
    pub canonical_name: String,
    /// Concordance group code from the comparability documentation
    pub comparability_code: i32,
}

impl VariableMapping {
    /// Convenience constructor for building mapping tables in code
    #[must_use]
    pub fn new(year: u16, source_name: &str, canonical_name: &str, comparability_code: i32) -> Self {
        Self {
            year,
            source_name: source_name.to_string(),
            canonical_name: canonical_name.to_string(),
            comparability_code,
        }
    }
}

/// Static mapping of (year, source variable) to canonical variable metadata
#[derive(Debug)]
pub struct VariableRegistry {
    mappings: Vec<VariableMapping>,
    by_source: FxHashMap<(u16, String), usize>,
    // Indexes in insertion order, so rollup source precedence is stable.
    by_canonical: FxHashMap<(u16, String), Vec<usize>>,
    canonical_names: Vec<String>,
}

impl VariableRegistry {
    /// Build and validate a registry from curated mapping rows.
    ///
    /// Fails with a configuration error when any (year, source) pair maps to
    /// two different canonical names; exact duplicate rows are dropped with
    /// a warning. The reference data is wrong in the first case and must be
    /// fixed, not recovered from.
    pub fn new(rows: Vec<VariableMapping>) -> Result<Self> {
        let mut mappings: Vec<VariableMapping> = Vec::with_capacity(rows.len());
        let mut by_source: FxHashMap<(u16, String), usize> = FxHashMap::default();
        let mut by_canonical: FxHashMap<(u16, String), Vec<usize>> = FxHashMap::default();
        let mut canonical_names: Vec<String> = Vec::new();

        for row in rows {
            let source_key = (row.year, row.source_name.clone());
            if let Some(&existing_idx) = by_source.get(&source_key) {
                let existing = &mappings[existing_idx];
                if existing.canonical_name == row.canonical_name {
                    warn!(
                        "Duplicate registry row for {} {} (canonical {}), ignoring",
                        row.year, row.source_name, row.canonical_name
                    );
                    continue;
                }
                return Err(HarmonizeError::Configuration(format!(
                    "Ambiguous mapping for {} {}: canonical '{}' vs '{}'",
                    row.year, row.source_name, existing.canonical_name, row.canonical_name
                )));
            }

            let idx = mappings.len();
            by_source.insert(source_key, idx);
            by_canonical
                .entry((row.year, row.canonical_name.clone()))
                .or_default()
                .push(idx);
            if !canonical_names.iter().any(|n| n == &row.canonical_name) {
                canonical_names.push(row.canonical_name.clone());
            }
            mappings.push(row);
        }

        canonical_names.sort();

        Ok(Self {
            mappings,
            by_source,
            by_canonical,
            canonical_names,
        })
    }

    /// Canonical name a source variable maps to in the given year
    #[must_use]
    pub fn lookup(&self, year: u16, source_name: &str) -> Option<&str> {
        self.by_source
            .get(&(year, source_name.to_string()))
            .map(|&idx| self.mappings[idx].canonical_name.as_str())
    }

    /// Concordance code of a canonical variable in the given year.
    ///
    /// When several source variables feed the canonical name, the code of the
    /// highest-precedence (first registered) source is reported.
    #[must_use]
    pub fn comparability_code(&self, year: u16, canonical_name: &str) -> Option<i32> {
        self.by_canonical
            .get(&(year, canonical_name.to_string()))
            .and_then(|indices| indices.first())
            .map(|&idx| self.mappings[idx].comparability_code)
    }

    /// Source variables feeding a canonical name in the given year, in
    /// registration (precedence) order. Empty when the canonical variable
    /// has no source that year.
    #[must_use]
    pub fn sources_for(&self, year: u16, canonical_name: &str) -> Vec<&str> {
        self.by_canonical
            .get(&(year, canonical_name.to_string()))
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| self.mappings[idx].source_name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All canonical names known to the registry, across every year, sorted
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.canonical_names.iter().map(String::as_str)
    }

    /// Number of mapping rows in the registry
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the registry holds no mappings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
