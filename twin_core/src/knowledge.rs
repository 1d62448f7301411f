//! Default knowledge base of substance profiles and genotype rules.
//!
//! This module provides the built-in reference data the engine runs
//! against, plus the glue that enriches a raw stack with profiles and
//! resolved phenotypes before simulation.

use crate::genotype::resolve_phenotype;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default knowledge base - built once and shared read-only
static DEFAULT_KNOWLEDGE: Lazy<KnowledgeBase> = Lazy::new(build_default_knowledge_internal);

/// Reference data for every known substance
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    pub substances: BTreeMap<String, SubstanceProfile>,
    /// Alternative names mapped to a canonical substance name
    pub aliases: BTreeMap<String, String>,
}

/// A stack with profiles and phenotypes attached, ready to simulate
#[derive(Clone, Debug)]
pub struct EnrichedStack {
    pub entries: Vec<StackEntry>,
    /// Keyed by the substance name used in each entry
    pub profiles: BTreeMap<String, SubstanceProfile>,
}

/// Get a reference to the cached default knowledge base
pub fn get_default_knowledge() -> &'static KnowledgeBase {
    &DEFAULT_KNOWLEDGE
}

/// Builds the default knowledge base
///
/// **Note**: For production use, prefer `get_default_knowledge()` which
/// returns a cached reference.
pub fn build_default_knowledge() -> KnowledgeBase {
    build_default_knowledge_internal()
}

/// The user simulated when no profile is supplied
pub fn default_user() -> UserProfile {
    let mut genetics = BTreeMap::new();
    genetics.insert("rs762551".to_string(), "CC".to_string());

    UserProfile {
        user_id: "demo_user".into(),
        name: "Demo User".into(),
        weight_kg: 70.0,
        genetics,
        health: HealthState::default(),
    }
}

fn phenotype(
    label: &str,
    half_life_hours: f64,
    clearance_modifier: f64,
    toxicity_risk: &str,
    recommendation: &str,
) -> PhenotypeProfile {
    PhenotypeProfile {
        phenotype_label: label.into(),
        half_life_hours: Some(half_life_hours),
        clearance_modifier,
        toxicity_risk: toxicity_risk.into(),
        recommendation: recommendation.into(),
    }
}

fn build_default_knowledge_internal() -> KnowledgeBase {
    let mut substances = BTreeMap::new();
    let mut aliases = BTreeMap::new();

    // ========================================================================
    // Stimulants
    // ========================================================================

    substances.insert(
        "Caffeine".to_string(),
        SubstanceProfile {
            name: "Caffeine".into(),
            class: SubstanceClass::Stimulant,
            volume_of_distribution_per_kg: 0.6,
            axis_effects: AxisEffects {
                neuro: 8.0,
                detox: 1.0,
                drug_load: 1.0,
            },
            thresholds: DoseThresholds {
                sleep_disruption: 50.0,
                liver_toxicity: 4000.0,
                lethal: 10000.0,
            },
            genotypes: caffeine_genotypes(),
        },
    );

    substances.insert(
        "Nicotine".to_string(),
        SubstanceProfile {
            name: "Nicotine".into(),
            class: SubstanceClass::Stimulant,
            volume_of_distribution_per_kg: 2.6,
            axis_effects: AxisEffects {
                neuro: 5.0,
                detox: 2.0,
                drug_load: 2.0,
            },
            thresholds: DoseThresholds {
                sleep_disruption: 2.0,
                liver_toxicity: 200.0,
                lethal: 500.0,
            },
            genotypes: GenotypeTable {
                gene: "CYP2A6".into(),
                variant_id: "rs1801272".into(),
                default_genotype: "AA".into(),
                genotypes: BTreeMap::from([
                    (
                        "AA".to_string(),
                        phenotype(
                            "Normal Metabolizer",
                            2.0,
                            1.0,
                            "Moderate",
                            "Typical clearance. Cravings return within a few hours.",
                        ),
                    ),
                    (
                        "AT".to_string(),
                        phenotype(
                            "Intermediate Metabolizer",
                            3.0,
                            0.7,
                            "Moderate",
                            "Nicotine lingers longer; space doses further apart.",
                        ),
                    ),
                    (
                        "TT".to_string(),
                        phenotype(
                            "Slow Metabolizer",
                            4.0,
                            0.5,
                            "High",
                            "Slow clearance. Evening use is likely to disturb sleep.",
                        ),
                    ),
                ]),
            },
        },
    );

    // ========================================================================
    // Depressants
    // ========================================================================

    substances.insert(
        "Alcohol".to_string(),
        SubstanceProfile {
            name: "Alcohol".into(),
            class: SubstanceClass::Depressant,
            volume_of_distribution_per_kg: 0.7,
            axis_effects: AxisEffects {
                neuro: -6.0,
                detox: 9.0,
                drug_load: 3.0,
            },
            thresholds: DoseThresholds {
                sleep_disruption: 8000.0,
                liver_toxicity: 40000.0,
                lethal: 250000.0,
            },
            genotypes: GenotypeTable {
                gene: "ADH1B".into(),
                variant_id: "rs1229984".into(),
                default_genotype: "CC".into(),
                genotypes: BTreeMap::from([
                    (
                        "CC".to_string(),
                        phenotype(
                            "Normal Metabolizer",
                            1.5,
                            1.0,
                            "Moderate",
                            "Stick to one unit per hour and alternate with water.",
                        ),
                    ),
                    (
                        "CT".to_string(),
                        phenotype(
                            "Fast Metabolizer",
                            1.0,
                            1.3,
                            "High",
                            "Rapid acetaldehyde build-up. Flushing is a stop signal.",
                        ),
                    ),
                    (
                        "TT".to_string(),
                        phenotype(
                            "Ultra-Fast Metabolizer",
                            0.8,
                            1.6,
                            "High",
                            "Acetaldehyde exposure is high. Keep intake minimal.",
                        ),
                    ),
                ]),
            },
        },
    );

    // ========================================================================
    // Analgesics
    // ========================================================================

    substances.insert(
        "Ibuprofen".to_string(),
        SubstanceProfile {
            name: "Ibuprofen".into(),
            class: SubstanceClass::Analgesic,
            volume_of_distribution_per_kg: 0.15,
            axis_effects: AxisEffects {
                neuro: 0.0,
                detox: 3.0,
                drug_load: 4.0,
            },
            thresholds: DoseThresholds {
                sleep_disruption: 100000.0,
                liver_toxicity: 3200.0,
                lethal: 20000.0,
            },
            genotypes: GenotypeTable {
                gene: "CYP2C9".into(),
                variant_id: "rs1057910".into(),
                default_genotype: "AA".into(),
                genotypes: BTreeMap::from([
                    (
                        "AA".to_string(),
                        phenotype(
                            "Normal Metabolizer",
                            2.0,
                            1.0,
                            "Low",
                            "Standard dosing intervals apply.",
                        ),
                    ),
                    (
                        "AC".to_string(),
                        phenotype(
                            "Intermediate Metabolizer",
                            3.3,
                            0.6,
                            "Moderate",
                            "Consider the lowest effective dose.",
                        ),
                    ),
                    (
                        "CC".to_string(),
                        phenotype(
                            "Poor Metabolizer",
                            5.0,
                            0.4,
                            "High",
                            "Reduced clearance raises bleeding and kidney risk.",
                        ),
                    ),
                ]),
            },
        },
    );

    // ========================================================================
    // Aliases
    // ========================================================================

    for alias in ["Coffee", "Coke", "Espresso"] {
        aliases.insert(alias.to_string(), "Caffeine".to_string());
    }
    aliases.insert("Ethanol".to_string(), "Alcohol".to_string());

    KnowledgeBase {
        substances,
        aliases,
    }
}

/// CYP1A2 rs762551 rules, also the fixed table behind single-substance clearance
pub fn caffeine_genotypes() -> GenotypeTable {
    GenotypeTable {
        gene: "CYP1A2".into(),
        variant_id: "rs762551".into(),
        default_genotype: "AC".into(),
        genotypes: BTreeMap::from([
            (
                "AA".to_string(),
                phenotype(
                    "Fast Metabolizer",
                    3.0,
                    1.0,
                    "Low",
                    "Caffeine clears quickly. An afternoon coffee is unlikely to affect sleep.",
                ),
            ),
            (
                "AC".to_string(),
                phenotype(
                    "Normal Metabolizer",
                    5.0,
                    0.8,
                    "Moderate",
                    "Keep caffeine before 2 PM to protect sleep quality.",
                ),
            ),
            (
                "CC".to_string(),
                phenotype(
                    "Slow Metabolizer",
                    8.0,
                    0.5,
                    "High",
                    "Caffeine lingers. Avoid it after noon and cap intake at 200mg.",
                ),
            ),
        ]),
    }
}

impl KnowledgeBase {
    /// Canonical name for a substance or alias, matched case-insensitively
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some((key, _)) = self
            .substances
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            return Some(key.as_str());
        }

        self.aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, target)| target.as_str())
    }

    /// Look up a substance profile by name or alias
    pub fn lookup(&self, name: &str) -> Option<&SubstanceProfile> {
        self.canonical_name(name)
            .and_then(|canonical| self.substances.get(canonical))
    }

    /// Attach profiles, phenotypes, and body weight to a raw stack
    ///
    /// Entries naming an unknown substance are kept as-is so the simulator
    /// can report them as skipped.
    pub fn enrich_stack(&self, entries: &[StackEntry], user: &UserProfile) -> EnrichedStack {
        let mut profiles = BTreeMap::new();
        let mut enriched = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut entry = entry.clone();

            match self.lookup(&entry.substance) {
                Some(profile) => {
                    if entry.phenotype.is_none() {
                        entry.phenotype = resolve_phenotype(&profile.genotypes, &user.genetics);
                    }
                    if entry.weight_kg.is_none() {
                        entry.weight_kg = Some(user.weight_kg);
                    }
                    profiles.insert(entry.substance.clone(), profile.clone());
                }
                None => {
                    tracing::debug!("No knowledge base entry for {:?}", entry.substance);
                }
            }

            enriched.push(entry);
        }

        EnrichedStack {
            entries: enriched,
            profiles,
        }
    }

    /// Validate the knowledge base for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, profile) in &self.substances {
            if key != &profile.name {
                errors.push(format!(
                    "Substance key '{}' doesn't match profile.name '{}'",
                    key, profile.name
                ));
            }
            if !(profile.volume_of_distribution_per_kg > 0.0) {
                errors.push(format!(
                    "Substance '{}' has non-positive volume of distribution",
                    key
                ));
            }

            let table = &profile.genotypes;
            if table.genotypes.is_empty() {
                errors.push(format!("Substance '{}' has no genotypes", key));
            } else if !table.genotypes.contains_key(&table.default_genotype) {
                errors.push(format!(
                    "Substance '{}': default genotype '{}' not in table",
                    key, table.default_genotype
                ));
            }

            for (genotype, phenotype) in &table.genotypes {
                match phenotype.half_life_hours {
                    Some(h) if h > 0.0 => {}
                    _ => errors.push(format!(
                        "Substance '{}': genotype '{}' has no positive half-life",
                        key, genotype
                    )),
                }
            }
        }

        for (alias, target) in &self.aliases {
            if !self.substances.contains_key(target) {
                errors.push(format!(
                    "Alias '{}' references non-existent substance '{}'",
                    alias, target
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_loads() {
        let kb = build_default_knowledge();
        assert_eq!(kb.substances.len(), 4);
        assert!(kb.substances.contains_key("Caffeine"));
    }

    #[test]
    fn test_default_knowledge_validates() {
        let kb = build_default_knowledge();
        let errors = kb.validate();
        assert!(
            errors.is_empty(),
            "Default knowledge base has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_validate_catches_broken_entries() {
        let mut kb = build_default_knowledge();
        kb.aliases.insert("Mystery".into(), "Unobtainium".into());
        if let Some(caffeine) = kb.substances.get_mut("Caffeine") {
            caffeine.genotypes.default_genotype = "GG".into();
        }

        let errors = kb.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_aliases_resolve_to_caffeine() {
        let kb = get_default_knowledge();
        assert_eq!(kb.canonical_name("Coke"), Some("Caffeine"));
        assert_eq!(kb.canonical_name("espresso"), Some("Caffeine"));
        assert_eq!(kb.canonical_name("CAFFEINE"), Some("Caffeine"));
        assert_eq!(kb.canonical_name("Unobtainium"), None);
    }

    #[test]
    fn test_scenario_genotype_half_life() {
        let table = caffeine_genotypes();
        assert_eq!(table.genotypes["CC"].half_life_hours, Some(8.0));
        assert_eq!(table.genotypes["AA"].half_life_hours, Some(3.0));
    }

    #[test]
    fn test_enrich_stack_resolves_known_entries() {
        let kb = get_default_knowledge();
        let user = default_user();
        let entries = vec![
            StackEntry {
                substance: "Espresso".into(),
                dose_mg: 65.0,
                start: Some("08:00".into()),
                phenotype: None,
                weight_kg: None,
            },
            StackEntry {
                substance: "Unobtainium".into(),
                dose_mg: 10.0,
                start: Some("09:00".into()),
                phenotype: None,
                weight_kg: None,
            },
        ];

        let enriched = kb.enrich_stack(&entries, &user);

        assert_eq!(enriched.entries.len(), 2);
        let espresso = &enriched.entries[0];
        assert_eq!(
            espresso.phenotype.as_ref().map(|p| p.phenotype_label.as_str()),
            Some("Slow Metabolizer")
        );
        assert_eq!(espresso.weight_kg, Some(70.0));
        assert!(enriched.profiles.contains_key("Espresso"));

        assert!(enriched.entries[1].phenotype.is_none());
        assert!(!enriched.profiles.contains_key("Unobtainium"));
    }
}
