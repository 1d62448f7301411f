//! Rule-based risk detection over timelines and forecasts.
//!
//! Every rule is evaluated independently and de-duplicated per kind, so a
//! run reports each risk at most once, at its first occurrence.

use crate::config::RiskConfig;
use crate::prognosis::Checkpoint;
use crate::{DoseEvent, HealthState, RiskEvent, RiskKind, Severity, SubstanceProfile, TimelineSlot};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Event label appended to a slot flagged for sleep disruption
pub const SLEEP_RISK_MARKER: &str = "Sleep Risk";

/// Flag sleep disruption at the slot nearest the configured bedtime
///
/// Marks the slot and returns at most one event.
pub fn detect_sleep_disruption(
    timeline: &mut [TimelineSlot],
    config: &RiskConfig,
) -> Option<RiskEvent> {
    let slot = timeline.iter_mut().min_by(|a, b| {
        let da = (a.hour_offset - config.sleep_check_hour).abs();
        let db = (b.hour_offset - config.sleep_check_hour).abs();
        da.total_cmp(&db)
    })?;

    if slot.axis_totals.neuro <= config.sleep_neuro_threshold {
        return None;
    }

    tracing::debug!(
        "Neuro load {:.2} at {} exceeds {}",
        slot.axis_totals.neuro,
        slot.label,
        config.sleep_neuro_threshold
    );
    slot.events.push(SLEEP_RISK_MARKER.to_string());

    Some(RiskEvent {
        kind: RiskKind::SleepDisruption,
        severity: Severity::High,
        time_label: slot.label.clone(),
        message: "High stimulant activity.".into(),
        year: None,
    })
}

/// Flag substances whose stacked daily total crosses a dose limit
///
/// Doses are accumulated in clock order; the event carries the time of the
/// dose that crossed the limit. Each (kind, substance) is reported once.
pub fn detect_dose_limits(
    doses: &[DoseEvent],
    profiles: &BTreeMap<String, SubstanceProfile>,
) -> Vec<RiskEvent> {
    let mut ordered: Vec<&DoseEvent> = doses.iter().collect();
    ordered.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.substance.cmp(&b.substance))
            .then_with(|| a.dose_mg.total_cmp(&b.dose_mg))
    });

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut emitted: BTreeSet<(RiskKind, &str)> = BTreeSet::new();
    let mut events = Vec::new();

    for dose in ordered {
        let Some(profile) = profiles.get(&dose.substance) else {
            continue;
        };
        let total = totals.entry(dose.substance.as_str()).or_insert(0.0);
        *total += dose.dose_mg;

        let rules = [
            (
                RiskKind::LiverToxicity,
                Severity::High,
                profile.thresholds.liver_toxicity,
            ),
            (
                RiskKind::LethalDose,
                Severity::Critical,
                profile.thresholds.lethal,
            ),
        ];

        for (kind, severity, limit) in rules {
            if *total > limit && emitted.insert((kind, dose.substance.as_str())) {
                events.push(RiskEvent {
                    kind,
                    severity,
                    time_label: dose.start.label_after(0.0),
                    message: format!(
                        "{} total of {:.0}mg exceeds the {:.0}mg limit.",
                        dose.substance, total, limit
                    ),
                    year: None,
                });
            }
        }
    }

    events
}

/// Tracks long-horizon rules across forecast checkpoints
#[derive(Debug)]
pub struct ChronicRiskMonitor<'a> {
    config: &'a RiskConfig,
    emitted: BTreeSet<RiskKind>,
    events: Vec<RiskEvent>,
}

impl<'a> ChronicRiskMonitor<'a> {
    pub fn new(config: &'a RiskConfig) -> Self {
        Self {
            config,
            emitted: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    /// Evaluate one checkpoint
    pub fn observe(&mut self, date: NaiveDate, year: u32, state: &HealthState) {
        if state.neuro_health < self.config.burnout_neuro_threshold {
            self.emit(
                RiskKind::Burnout,
                Severity::High,
                date,
                year,
                format!("Neuro-receptor downregulation (burnout) detected in year {}.", year),
            );
        }

        if state.cardio_health < self.config.hypertension_cardio_threshold {
            self.emit(
                RiskKind::Hypertension,
                Severity::Moderate,
                date,
                year,
                format!(
                    "Pre-hypertension predicted in year {} due to chronic stimulant use.",
                    year
                ),
            );
        }
    }

    fn emit(&mut self, kind: RiskKind, severity: Severity, date: NaiveDate, year: u32, message: String) {
        if !self.emitted.insert(kind) {
            return;
        }

        tracing::info!("{} first flagged at {} (year {})", kind, date, year);
        self.events.push(RiskEvent {
            kind,
            severity,
            time_label: date.format("%Y-%m-%d").to_string(),
            message,
            year: Some(year),
        });
    }

    pub fn into_events(self) -> Vec<RiskEvent> {
        self.events
    }
}

/// Re-scan finished forecast checkpoints, e.g. with different thresholds
pub fn detect_chronic_risks(checkpoints: &[Checkpoint], config: &RiskConfig) -> Vec<RiskEvent> {
    let mut monitor = ChronicRiskMonitor::new(config);
    for checkpoint in checkpoints {
        monitor.observe(checkpoint.date, checkpoint.year, &checkpoint.health());
    }
    monitor.into_events()
}
