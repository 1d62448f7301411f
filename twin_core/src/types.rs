//! Core domain types for the Biotwin simulation engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Substance reference data and resolved phenotypes
//! - Dose events and stack entries
//! - Timeline slots and risk events
//! - Long-horizon health state and habit exposure

use crate::clock::ClockTime;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Substance Reference Data
// ============================================================================

/// Pharmacological class of a substance
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubstanceClass {
    Stimulant,
    Depressant,
    Analgesic,
    Other,
}

/// Per-dose load a substance puts on each physiological axis
///
/// Negative neuro values sedate, positive values stimulate.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisEffects {
    pub neuro: f64,
    pub detox: f64,
    pub drug_load: f64,
}

/// Dose limits for a substance, all in mg
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DoseThresholds {
    /// Residual level that prevents sleep
    pub sleep_disruption: f64,
    /// Daily total that strains the liver
    pub liver_toxicity: f64,
    pub lethal: f64,
}

impl Default for DoseThresholds {
    fn default() -> Self {
        Self {
            sleep_disruption: 10.0,
            liver_toxicity: 4000.0,
            lethal: 10000.0,
        }
    }
}

/// Metabolizer phenotype resolved for one (substance, user) pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhenotypeProfile {
    pub phenotype_label: String,
    #[serde(default)]
    pub half_life_hours: Option<f64>,
    #[serde(default = "default_clearance_modifier")]
    pub clearance_modifier: f64,
    #[serde(default)]
    pub toxicity_risk: String,
    #[serde(default)]
    pub recommendation: String,
}

fn default_clearance_modifier() -> f64 {
    1.0
}

/// Genotype rules for the gene that metabolizes a substance
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenotypeTable {
    pub gene: String,
    /// SNP identifier looked up in the user's genetics (e.g. "rs762551")
    pub variant_id: String,
    /// Genotype assumed when the user's variant is unknown
    pub default_genotype: String,
    pub genotypes: BTreeMap<String, PhenotypeProfile>,
}

/// Static pharmacokinetic and effect parameters for one substance
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstanceProfile {
    pub name: String,
    pub class: SubstanceClass,
    /// Volume of distribution (L/kg)
    pub volume_of_distribution_per_kg: f64,
    #[serde(default)]
    pub axis_effects: AxisEffects,
    #[serde(default)]
    pub thresholds: DoseThresholds,
    pub genotypes: GenotypeTable,
}

// ============================================================================
// Dose and Stack Types
// ============================================================================

/// A validated intake: one dose of one substance at a clock time
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    pub substance: String,
    pub dose_mg: f64,
    pub start: ClockTime,
}

/// One raw stack entry, paired with its pre-resolved phenotype
///
/// Nothing here is trusted: the simulator validates each entry and skips
/// the ones it cannot use.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackEntry {
    pub substance: String,
    #[serde(default = "missing_dose", deserialize_with = "lenient_dose")]
    pub dose_mg: f64,
    /// "HH:MM"; midnight when absent
    #[serde(default, alias = "time")]
    pub start: Option<String>,
    #[serde(default)]
    pub phenotype: Option<PhenotypeProfile>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

fn missing_dose() -> f64 {
    f64::NAN
}

/// Accept a number or a numeric string; anything else becomes NaN
fn lenient_dose<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

// ============================================================================
// Timeline Types
// ============================================================================

/// Accumulated load on each physiological axis
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AxisTotals {
    pub neuro: f64,
    pub detox: f64,
    pub drug_load: f64,
}

impl AxisTotals {
    /// Add `fraction` of a substance's axis effects
    pub fn add_weighted(&mut self, effects: &AxisEffects, fraction: f64) {
        self.neuro += effects.neuro * fraction;
        self.detox += effects.detox * fraction;
        self.drug_load += effects.drug_load * fraction;
    }
}

/// One discretized step of the stack timeline
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSlot {
    /// Clock hour of the slot (0.0 = midnight)
    pub hour_offset: f64,
    pub label: String,
    /// Remaining mg per active substance
    pub per_substance_mg: BTreeMap<String, f64>,
    pub axis_totals: AxisTotals,
    pub events: Vec<String>,
}

impl TimelineSlot {
    pub fn new(hour_offset: f64) -> Self {
        Self {
            hour_offset,
            label: crate::clock::format_clock_label(hour_offset),
            per_substance_mg: BTreeMap::new(),
            axis_totals: AxisTotals::default(),
            events: Vec::new(),
        }
    }
}

// ============================================================================
// Risk Types
// ============================================================================

/// Kind of detected risk
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskKind {
    #[serde(rename = "Sleep Disruption")]
    SleepDisruption,
    #[serde(rename = "Liver Toxicity")]
    LiverToxicity,
    #[serde(rename = "Lethal Dose")]
    LethalDose,
    #[serde(rename = "BURNOUT")]
    Burnout,
    #[serde(rename = "HYPERTENSION")]
    Hypertension,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::SleepDisruption => "Sleep Disruption",
            RiskKind::LiverToxicity => "Liver Toxicity",
            RiskKind::LethalDose => "Lethal Dose",
            RiskKind::Burnout => "BURNOUT",
            RiskKind::Hypertension => "HYPERTENSION",
        }
    }
}

impl std::fmt::Display for RiskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Moderate,
    High,
    Critical,
}

/// A flagged threshold violation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskEvent {
    pub kind: RiskKind,
    pub severity: Severity,
    /// Clock label for timeline risks, ISO date for forecast risks
    pub time_label: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

// ============================================================================
// Long-Horizon Types
// ============================================================================

/// Chronic health scores, each kept within [0, 100]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthState {
    pub liver_health: f64,
    pub neuro_health: f64,
    pub cardio_health: f64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            liver_health: 95.0,
            neuro_health: 85.0,
            cardio_health: 90.0,
        }
    }
}

impl HealthState {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Clamp every component into [0, 100]; NaN collapses to 0
    pub fn clamp(&mut self) {
        self.liver_health = clamp_score(self.liver_health);
        self.neuro_health = clamp_score(self.neuro_health);
        self.cardio_health = clamp_score(self.cardio_health);
    }

    pub fn is_within_bounds(&self) -> bool {
        [self.liver_health, self.neuro_health, self.cardio_health]
            .iter()
            .all(|v| (Self::MIN..=Self::MAX).contains(v))
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        HealthState::MIN
    } else {
        value.clamp(HealthState::MIN, HealthState::MAX)
    }
}

/// One day's aggregate exposure, treated as constant over a forecast
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitInput {
    pub caffeine_mg: f64,
    pub alcohol_units: f64,
    pub avg_sleep_hours: f64,
}

/// A logged intake used for habit aggregation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeLog {
    pub date: NaiveDate,
    pub substance: String,
    pub dose_mg: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// The person being simulated
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub weight_kg: f64,
    /// Variant id to genotype, e.g. "rs762551" -> "CC"
    #[serde(default)]
    pub genetics: BTreeMap<String, String>,
    #[serde(default)]
    pub health: HealthState,
}

// ============================================================================
// Formatting
// ============================================================================

/// Round to a fixed number of decimal places for output
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
