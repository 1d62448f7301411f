//! Dashboard classification of a simulated day.

use crate::config::SummaryConfig;
use crate::TimelineSlot;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum NeuroStatus {
    #[serde(rename = "Over-Stimulated")]
    OverStimulated,
    Sedated,
    Optimal,
}

impl NeuroStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeuroStatus::OverStimulated => "Over-Stimulated",
            NeuroStatus::Sedated => "Sedated",
            NeuroStatus::Optimal => "Optimal",
        }
    }
}

impl fmt::Display for NeuroStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DetoxStatus {
    #[serde(rename = "Toxic Overload")]
    ToxicOverload,
    Stressed,
    Healthy,
}

impl DetoxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetoxStatus::ToxicOverload => "Toxic Overload",
            DetoxStatus::Stressed => "Stressed",
            DetoxStatus::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for DetoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub peak_neuro: f64,
    pub peak_detox: f64,
    /// Neuro load at the first 23:00 or 23:30 slot
    pub late_neuro: f64,
    pub neuro_status: NeuroStatus,
    pub detox_status: DetoxStatus,
}

pub fn summarize(timeline: &[TimelineSlot], config: &SummaryConfig) -> TimelineSummary {
    let peak = |axis: fn(&TimelineSlot) -> f64| timeline.iter().map(axis).reduce(f64::max).unwrap_or(0.0);
    let peak_neuro = peak(|s| s.axis_totals.neuro);
    let peak_detox = peak(|s| s.axis_totals.detox);

    let late_neuro = timeline
        .iter()
        .find(|s| s.hour_offset == 23.0 || s.hour_offset == 23.5)
        .map(|s| s.axis_totals.neuro)
        .unwrap_or(0.0);

    let neuro_status = if late_neuro > config.over_stimulated_neuro {
        NeuroStatus::OverStimulated
    } else if late_neuro < config.sedated_neuro {
        NeuroStatus::Sedated
    } else {
        NeuroStatus::Optimal
    };

    let detox_status = if peak_detox > config.toxic_overload_detox {
        DetoxStatus::ToxicOverload
    } else if peak_detox > config.stressed_detox {
        DetoxStatus::Stressed
    } else {
        DetoxStatus::Healthy
    };

    TimelineSummary {
        peak_neuro,
        peak_detox,
        late_neuro,
        neuro_status,
        detox_status,
    }
}
