//! Aggregate dated intake logs into a daily habit profile.

use crate::knowledge::KnowledgeBase;
use crate::{HabitInput, IntakeLog};
use std::collections::BTreeSet;

/// Ethanol per standard alcohol unit
pub const MG_ETHANOL_PER_UNIT: f64 = 8000.0;

/// Average logged caffeine and alcohol over the distinct days present
///
/// Substances other than caffeine and alcohol (including aliases of either)
/// are ignored. An empty log yields zero exposure.
pub fn habits_from_logs(logs: &[IntakeLog], knowledge: &KnowledgeBase, avg_sleep_hours: f64) -> HabitInput {
    let mut days = BTreeSet::new();
    let mut caffeine_mg = 0.0;
    let mut alcohol_mg = 0.0;

    for log in logs {
        days.insert(log.date);

        if !log.dose_mg.is_finite() || log.dose_mg < 0.0 {
            tracing::warn!("Ignoring {} log on {} with dose {}", log.substance, log.date, log.dose_mg);
            continue;
        }

        match knowledge.canonical_name(&log.substance) {
            Some("Caffeine") => caffeine_mg += log.dose_mg,
            Some("Alcohol") => alcohol_mg += log.dose_mg,
            _ => {}
        }
    }

    if days.is_empty() {
        return HabitInput {
            avg_sleep_hours,
            ..HabitInput::default()
        };
    }

    let day_count = days.len() as f64;
    tracing::debug!("Aggregated {} logs across {} days", logs.len(), days.len());

    HabitInput {
        caffeine_mg: caffeine_mg / day_count,
        alcohol_units: alcohol_mg / MG_ETHANOL_PER_UNIT / day_count,
        avg_sleep_hours,
    }
}
