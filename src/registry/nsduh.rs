//! Curated NSDUH lifetime-use flag mappings
//!
//! The public-use files renamed many lifetime flags when questionnaire items
//! changed (e.g. the ecstasy item adding "molly" in 2015, the 2015 overhaul
//! of the psychotherapeutic items). Each canonical flag below lists its
//! source variables in precedence order: the current name first, then the
//! legacy names it rolls up.
//!
//! This table is reference data; callers with their own concordance extract
//! can build a `VariableRegistry` from arbitrary rows instead.

use super::VariableMapping;

/// Canonical lifetime flags and their source variables in precedence order
pub const LIFETIME_FLAG_SOURCES: [(&str, &[&str]); 21] = [
    ("alcohol", &["ALCFLAG"]),
    ("any_illicit", &["ILLFLAG", "SUMFLAG"]),
    ("cigarettes", &["CIGFLAG"]),
    ("cocaine", &["COCFLAG"]),
    ("crack", &["CRKFLAG"]),
    ("ecstasy", &["ECSTMOFLAG", "ECSFLAG", "ECSTASY"]),
    ("hallucinogens", &["HALLUCFLAG", "HALFLAG"]),
    ("heroin", &["HERFLAG"]),
    ("illicit_except_marijuana", &["ILLEMFLAG", "IEMFLAG"]),
    ("inhalants", &["INHALFLAG", "INHFLAG"]),
    ("ketamine", &["KETAFLGR", "KETMINFLAG"]),
    ("lsd", &["LSDFLAG"]),
    ("marijuana", &["MRJFLAG", "MJOFLAG"]),
    ("methamphetamine", &["METHAMFLAG", "MTHFLAG"]),
    ("pain_relievers", &["PNRANYFLAG", "ANLFLAG"]),
    ("pcp", &["PCPFLAG"]),
    ("psychotherapeutics", &["PSYANYFLAG2", "PSYFLAG2"]),
    ("sedatives", &["SEDANYFLAG", "SEDFLAG"]),
    ("stimulants", &["STMANYFLAG", "STMFLAG"]),
    ("tobacco", &["TOBFLAG"]),
    ("tranquilizers", &["TRQANYFLAG", "TRQFLAG"]),
];

/// Build registry rows for the curated lifetime flags over a span of years.
///
/// Every candidate source is registered for every year; which sources a year
/// actually carries is resolved against the year's real column set at recode
/// time. The concordance code is the flag's position in the curated table,
/// so all sources of one canonical flag share a group.
#[must_use]
pub fn lifetime_flag_mappings(years: impl IntoIterator<Item = u16>) -> Vec<VariableMapping> {
    let mut rows = Vec::new();
    for year in years {
        for (group, (canonical, sources)) in LIFETIME_FLAG_SOURCES.iter().enumerate() {
            for source in *sources {
                rows.push(VariableMapping::new(
                    year,
                    source,
                    canonical,
                    i32::try_from(group + 1).unwrap_or(i32::MAX),
                ));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VariableRegistry;

    #[test]
    fn curated_table_builds_a_valid_registry() {
        let registry = VariableRegistry::new(lifetime_flag_mappings(1979..=2024)).unwrap();
        assert_eq!(registry.lookup(2002, "MRJFLAG"), Some("marijuana"));
        assert_eq!(
            registry.sources_for(2016, "ecstasy"),
            vec!["ECSTMOFLAG", "ECSFLAG", "ECSTASY"]
        );
    }

    #[test]
    fn sources_map_to_one_canonical_name_per_year() {
        let rows = lifetime_flag_mappings([2002]);
        let mut seen = std::collections::HashMap::new();
        for row in &rows {
            let prior = seen.insert(&row.source_name, &row.canonical_name);
            if let Some(prior) = prior {
                assert_eq!(prior, &row.canonical_name);
            }
        }
    }
}
