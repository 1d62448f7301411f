//! Genotype to phenotype resolution.
//!
//! Two lookups over a substance's genotype table:
//! - [`resolve_phenotype`] is lenient and used when building a stack: it
//!   falls back to the table's default genotype when the user's variant is
//!   unknown.
//! - [`lookup_genotype`] is strict and used by the single-substance
//!   clearance curve.

use crate::{Error, GenotypeTable, PhenotypeProfile, Result};
use std::collections::BTreeMap;

/// Genotype assumed for a user with no recorded marker
pub const WILD_TYPE: &str = "WildType";

/// Resolve the phenotype for a user's genetics against one table
///
/// Returns `None` only when the table has no genotypes at all.
pub fn resolve_phenotype(
    table: &GenotypeTable,
    genetics: &BTreeMap<String, String>,
) -> Option<PhenotypeProfile> {
    let user_genotype = genetics
        .get(&table.variant_id)
        .map(String::as_str)
        .unwrap_or(WILD_TYPE);

    if let Some(profile) = table.genotypes.get(user_genotype) {
        return Some(profile.clone());
    }

    tracing::debug!(
        "Genotype {:?} for {} not in {} table, using default {:?}",
        user_genotype,
        table.variant_id,
        table.gene,
        table.default_genotype
    );

    table
        .genotypes
        .get(&table.default_genotype)
        .or_else(|| table.genotypes.values().next())
        .cloned()
}

/// Look up a phenotype by exact genotype label
pub fn lookup_genotype(table: &GenotypeTable, genotype: &str) -> Result<PhenotypeProfile> {
    table
        .genotypes
        .get(genotype)
        .cloned()
        .ok_or_else(|| Error::InvalidGenotype(genotype.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phenotype(label: &str, half_life: f64) -> PhenotypeProfile {
        PhenotypeProfile {
            phenotype_label: label.into(),
            half_life_hours: Some(half_life),
            clearance_modifier: 1.0,
            toxicity_risk: "Low".into(),
            recommendation: String::new(),
        }
    }

    fn table() -> GenotypeTable {
        let mut genotypes = BTreeMap::new();
        genotypes.insert("AA".to_string(), phenotype("Fast Metabolizer", 3.0));
        genotypes.insert("CC".to_string(), phenotype("Slow Metabolizer", 8.0));
        GenotypeTable {
            gene: "CYP1A2".into(),
            variant_id: "rs762551".into(),
            default_genotype: "AA".into(),
            genotypes,
        }
    }

    #[test]
    fn test_resolves_user_genotype() {
        let mut genetics = BTreeMap::new();
        genetics.insert("rs762551".to_string(), "CC".to_string());

        let resolved = resolve_phenotype(&table(), &genetics).unwrap();
        assert_eq!(resolved.phenotype_label, "Slow Metabolizer");
    }

    #[test]
    fn test_missing_marker_falls_back_to_default() {
        let resolved = resolve_phenotype(&table(), &BTreeMap::new()).unwrap();
        assert_eq!(resolved.phenotype_label, "Fast Metabolizer");
    }

    #[test]
    fn test_unknown_genotype_falls_back_to_first_when_default_missing() {
        let mut t = table();
        t.default_genotype = "ZZ".into();
        let mut genetics = BTreeMap::new();
        genetics.insert("rs762551".to_string(), "GG".to_string());

        let resolved = resolve_phenotype(&t, &genetics).unwrap();
        assert_eq!(resolved.phenotype_label, "Fast Metabolizer");
    }

    #[test]
    fn test_empty_table_resolves_none() {
        let mut t = table();
        t.genotypes.clear();
        assert!(resolve_phenotype(&t, &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_strict_lookup() {
        assert_eq!(lookup_genotype(&table(), "CC").unwrap().half_life_hours, Some(8.0));
        assert!(matches!(
            lookup_genotype(&table(), "XY"),
            Err(Error::InvalidGenotype(g)) if g == "XY"
        ));
    }
}
