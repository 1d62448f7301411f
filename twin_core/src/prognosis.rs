//! Long-horizon health projection.
//!
//! Steps one day at a time from a starting [`HealthState`] under constant
//! daily habits. Recovery depends on the current state (scarring below the
//! liver damage threshold), so there is no closed form; the loop is the model.

use crate::config::{Config, PrognosisConfig};
use crate::risk::ChronicRiskMonitor;
use crate::types::round_to;
use crate::{HabitInput, HealthState, RiskEvent};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: u32 = 365;

/// Health sampled at one checkpoint, rounded to one decimal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(rename = "checkpointDate")]
    pub date: NaiveDate,
    pub year: u32,
    pub liver_health: f64,
    pub neuro_health: f64,
    pub cardio_health: f64,
}

impl Checkpoint {
    fn sample(date: NaiveDate, year: u32, state: &HealthState) -> Self {
        Self {
            date,
            year,
            liver_health: round_to(state.liver_health, 1),
            neuro_health: round_to(state.neuro_health, 1),
            cardio_health: round_to(state.cardio_health, 1),
        }
    }

    pub fn health(&self) -> HealthState {
        HealthState {
            liver_health: self.liver_health,
            neuro_health: self.neuro_health,
            cardio_health: self.cardio_health,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub checkpoints: Vec<Checkpoint>,
    pub risks: Vec<RiskEvent>,
    #[serde(rename = "finalHealthState")]
    pub final_state: HealthState,
}

/// Apply one day of damage, recovery and clamping
pub fn step_day(state: &mut HealthState, habits: &HabitInput, config: &PrognosisConfig) {
    // Damage
    let stress_load = (habits.caffeine_mg / 100.0) * config.neuro_stress_per_100mg_caffeine;
    state.neuro_health -= stress_load;
    state.cardio_health -= stress_load * config.cardio_stress_fraction;
    state.liver_health -= habits.alcohol_units * config.liver_damage_per_alcohol_unit;

    // Recovery
    if state.liver_health > config.liver_damage_threshold {
        state.liver_health += config.liver_recovery_rate;
    } else {
        state.liver_health += config.liver_recovery_rate * config.scarred_recovery_factor;
    }
    state.neuro_health +=
        config.neuro_recovery_rate * (habits.avg_sleep_hours / config.reference_sleep_hours);

    state.clamp();
}

/// Project health forward `years` from `start_date`
pub fn project_health(
    start: HealthState,
    habits: &HabitInput,
    years: u32,
    start_date: NaiveDate,
    config: &Config,
) -> ForecastReport {
    let years = if years > config.prognosis.max_years {
        tracing::warn!(
            "Forecast of {} years exceeds the {} year limit, truncating",
            years,
            config.prognosis.max_years
        );
        config.prognosis.max_years
    } else {
        years
    };
    let total_days = years.saturating_mul(DAYS_PER_YEAR);
    let interval = config.prognosis.checkpoint_interval_days.max(1);

    tracing::info!(
        "Projecting {} days (caffeine {}mg, alcohol {} units, sleep {}h)",
        total_days,
        habits.caffeine_mg,
        habits.alcohol_units,
        habits.avg_sleep_hours
    );

    let mut state = start;
    let mut checkpoint_date = start_date;
    let mut checkpoints = Vec::new();
    let mut monitor = ChronicRiskMonitor::new(&config.risk);

    for day in 1..=total_days {
        step_day(&mut state, habits, &config.prognosis);

        if day % interval != 0 {
            continue;
        }

        checkpoint_date = checkpoint_date
            .checked_add_signed(Duration::days(i64::from(interval)))
            .unwrap_or(checkpoint_date);
        let year = day.div_ceil(DAYS_PER_YEAR);

        monitor.observe(checkpoint_date, year, &state);
        checkpoints.push(Checkpoint::sample(checkpoint_date, year, &state));
    }

    let risks = monitor.into_events();
    tracing::debug!(
        "Forecast finished with {} checkpoints and {} risks",
        checkpoints.len(),
        risks.len()
    );

    ForecastReport {
        checkpoints,
        risks,
        final_state: state,
    }
}

/// Project health starting from today's local date
pub fn project_health_from_today(
    start: HealthState,
    habits: &HabitInput,
    years: u32,
    config: &Config,
) -> ForecastReport {
    project_health(start, habits, years, Local::now().date_naive(), config)
}
