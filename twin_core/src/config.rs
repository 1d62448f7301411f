//! Configuration file support for Biotwin.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/biotwin/config.toml`.
//! Every threshold and coefficient the engine uses lives here so it can be
//! overridden without touching code.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub clearance: ClearanceConfig,

    #[serde(default)]
    pub stack: StackConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub prognosis: PrognosisConfig,

    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Single-substance clearance curve parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClearanceConfig {
    /// Volume of distribution per kg of body weight (L/kg)
    #[serde(default = "default_distribution_coefficient")]
    pub distribution_coefficient_per_kg: f64,

    /// Remaining mg below which a substance counts as cleared
    #[serde(default = "default_cleared_threshold_mg")]
    pub cleared_threshold_mg: f64,

    /// Remaining mg below which the curve stops early
    #[serde(default = "default_clearance_negligible_mg")]
    pub negligible_mg: f64,

    /// Last hour offset simulated
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            distribution_coefficient_per_kg: default_distribution_coefficient(),
            cleared_threshold_mg: default_cleared_threshold_mg(),
            negligible_mg: default_clearance_negligible_mg(),
            horizon_hours: default_horizon_hours(),
        }
    }
}

/// Multi-substance timeline parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StackConfig {
    /// Body weight used when an entry carries none
    #[serde(default = "default_weight_kg")]
    pub default_weight_kg: f64,

    /// Number of timeline slots, starting at hour 0
    #[serde(default = "default_slot_count")]
    pub slot_count: usize,

    /// Hours between consecutive slots
    #[serde(default = "default_slot_step_hours")]
    pub slot_step_hours: f64,

    /// Remaining mg at or below which a dose stops contributing
    #[serde(default = "default_stack_negligible_mg")]
    pub negligible_mg: f64,

    /// Half-life used when a resolved phenotype carries none
    #[serde(default = "default_fallback_half_life_hours")]
    pub fallback_half_life_hours: f64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            default_weight_kg: default_weight_kg(),
            slot_count: default_slot_count(),
            slot_step_hours: default_slot_step_hours(),
            negligible_mg: default_stack_negligible_mg(),
            fallback_half_life_hours: default_fallback_half_life_hours(),
        }
    }
}

/// Risk rule thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Clock hour inspected for sleep disruption
    #[serde(default = "default_sleep_check_hour")]
    pub sleep_check_hour: f64,

    /// Neuro axis load above which sleep is disrupted
    #[serde(default = "default_sleep_neuro_threshold")]
    pub sleep_neuro_threshold: f64,

    /// Neuro health below which burnout is flagged
    #[serde(default = "default_burnout_neuro_threshold")]
    pub burnout_neuro_threshold: f64,

    /// Cardio health below which hypertension is flagged
    #[serde(default = "default_hypertension_cardio_threshold")]
    pub hypertension_cardio_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            sleep_check_hour: default_sleep_check_hour(),
            sleep_neuro_threshold: default_sleep_neuro_threshold(),
            burnout_neuro_threshold: default_burnout_neuro_threshold(),
            hypertension_cardio_threshold: default_hypertension_cardio_threshold(),
        }
    }
}

/// Long-horizon damage and recovery coefficients
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrognosisConfig {
    #[serde(default = "default_years")]
    pub default_years: u32,

    /// Longest forecast a run will step through
    #[serde(default = "default_max_years")]
    pub max_years: u32,

    #[serde(default = "default_checkpoint_interval_days")]
    pub checkpoint_interval_days: u32,

    /// Neuro damage per 100mg of daily caffeine
    #[serde(default = "default_neuro_stress_per_100mg_caffeine")]
    pub neuro_stress_per_100mg_caffeine: f64,

    /// Share of the daily stress load that hits cardio health
    #[serde(default = "default_cardio_stress_fraction")]
    pub cardio_stress_fraction: f64,

    #[serde(default = "default_liver_damage_per_alcohol_unit")]
    pub liver_damage_per_alcohol_unit: f64,

    /// Nightly liver recovery above the damage threshold
    #[serde(default = "default_liver_recovery_rate")]
    pub liver_recovery_rate: f64,

    /// Liver health at or below which recovery is scarred
    #[serde(default = "default_liver_damage_threshold")]
    pub liver_damage_threshold: f64,

    #[serde(default = "default_scarred_recovery_factor")]
    pub scarred_recovery_factor: f64,

    /// Nightly neuro recovery at reference sleep
    #[serde(default = "default_neuro_recovery_rate")]
    pub neuro_recovery_rate: f64,

    #[serde(default = "default_reference_sleep_hours")]
    pub reference_sleep_hours: f64,
}

impl Default for PrognosisConfig {
    fn default() -> Self {
        Self {
            default_years: default_years(),
            max_years: default_max_years(),
            checkpoint_interval_days: default_checkpoint_interval_days(),
            neuro_stress_per_100mg_caffeine: default_neuro_stress_per_100mg_caffeine(),
            cardio_stress_fraction: default_cardio_stress_fraction(),
            liver_damage_per_alcohol_unit: default_liver_damage_per_alcohol_unit(),
            liver_recovery_rate: default_liver_recovery_rate(),
            liver_damage_threshold: default_liver_damage_threshold(),
            scarred_recovery_factor: default_scarred_recovery_factor(),
            neuro_recovery_rate: default_neuro_recovery_rate(),
            reference_sleep_hours: default_reference_sleep_hours(),
        }
    }
}

/// Dashboard classification thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_over_stimulated_neuro")]
    pub over_stimulated_neuro: f64,

    #[serde(default = "default_sedated_neuro")]
    pub sedated_neuro: f64,

    #[serde(default = "default_stressed_detox")]
    pub stressed_detox: f64,

    #[serde(default = "default_toxic_overload_detox")]
    pub toxic_overload_detox: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            over_stimulated_neuro: default_over_stimulated_neuro(),
            sedated_neuro: default_sedated_neuro(),
            stressed_detox: default_stressed_detox(),
            toxic_overload_detox: default_toxic_overload_detox(),
        }
    }
}

// Default value functions
fn default_distribution_coefficient() -> f64 {
    0.6
}

fn default_cleared_threshold_mg() -> f64 {
    10.0
}

fn default_clearance_negligible_mg() -> f64 {
    0.1
}

fn default_horizon_hours() -> u32 {
    24
}

fn default_weight_kg() -> f64 {
    70.0
}

fn default_slot_count() -> usize {
    49
}

fn default_slot_step_hours() -> f64 {
    0.5
}

fn default_stack_negligible_mg() -> f64 {
    0.5
}

fn default_fallback_half_life_hours() -> f64 {
    4.0
}

fn default_sleep_check_hour() -> f64 {
    23.0
}

fn default_sleep_neuro_threshold() -> f64 {
    2.0
}

fn default_burnout_neuro_threshold() -> f64 {
    30.0
}

fn default_hypertension_cardio_threshold() -> f64 {
    50.0
}

fn default_years() -> u32 {
    5
}

fn default_max_years() -> u32 {
    100
}

fn default_checkpoint_interval_days() -> u32 {
    30
}

fn default_neuro_stress_per_100mg_caffeine() -> f64 {
    0.5
}

fn default_cardio_stress_fraction() -> f64 {
    0.2
}

fn default_liver_damage_per_alcohol_unit() -> f64 {
    2.5
}

fn default_liver_recovery_rate() -> f64 {
    0.8
}

fn default_liver_damage_threshold() -> f64 {
    40.0
}

fn default_scarred_recovery_factor() -> f64 {
    0.5
}

fn default_neuro_recovery_rate() -> f64 {
    1.2
}

fn default_reference_sleep_hours() -> f64 {
    8.0
}

fn default_over_stimulated_neuro() -> f64 {
    2.0
}

fn default_sedated_neuro() -> f64 {
    -2.0
}

fn default_stressed_detox() -> f64 {
    5.0
}

fn default_toxic_overload_detox() -> f64 {
    10.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            Some(config_path) => {
                tracing::info!("No config file found at {:?}, using defaults", config_path);
                Ok(Self::default())
            }
            None => {
                tracing::info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("biotwin").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values that would make a run meaningless or unbounded
    pub fn validate(&self) -> Result<()> {
        if !(self.clearance.distribution_coefficient_per_kg > 0.0) {
            return Err(Error::Config(
                "clearance.distribution_coefficient_per_kg must be positive".into(),
            ));
        }
        if !(self.stack.default_weight_kg > 0.0) {
            return Err(Error::Config("stack.default_weight_kg must be positive".into()));
        }
        if !(self.stack.slot_step_hours > 0.0) {
            return Err(Error::Config("stack.slot_step_hours must be positive".into()));
        }
        if self.stack.slot_count == 0 {
            return Err(Error::Config("stack.slot_count must be at least 1".into()));
        }
        if !(self.stack.fallback_half_life_hours > 0.0) {
            return Err(Error::Config(
                "stack.fallback_half_life_hours must be positive".into(),
            ));
        }
        if self.prognosis.default_years > self.prognosis.max_years {
            return Err(Error::Config(format!(
                "prognosis.default_years must not exceed max_years ({})",
                self.prognosis.max_years
            )));
        }
        if self.prognosis.checkpoint_interval_days == 0 {
            return Err(Error::Config(
                "prognosis.checkpoint_interval_days must be at least 1".into(),
            ));
        }
        if !(self.prognosis.reference_sleep_hours > 0.0) {
            return Err(Error::Config(
                "prognosis.reference_sleep_hours must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clearance.cleared_threshold_mg, 10.0);
        assert_eq!(config.clearance.negligible_mg, 0.1);
        assert_eq!(config.stack.negligible_mg, 0.5);
        assert_eq!(config.stack.default_weight_kg, 70.0);
        assert_eq!(config.stack.slot_count, 49);
        assert_eq!(config.risk.sleep_neuro_threshold, 2.0);
        assert_eq!(config.risk.burnout_neuro_threshold, 30.0);
        assert_eq!(config.risk.hypertension_cardio_threshold, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.prognosis.default_years = 10;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.prognosis.default_years, 10);
        assert_eq!(
            parsed.clearance.distribution_coefficient_per_kg,
            config.clearance.distribution_coefficient_per_kg
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[risk]
sleep_neuro_threshold = 3.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.risk.sleep_neuro_threshold, 3.5);
        assert_eq!(config.risk.sleep_check_hour, 23.0); // default
        assert_eq!(config.stack.slot_step_hours, 0.5); // default section
    }

    #[test]
    fn test_default_years_bounded_by_max_years() {
        let toml_str = "[prognosis]\ndefault_years = 500\n";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.prognosis.max_years, 100);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[stack]\nslot_step_hours = 0.0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
