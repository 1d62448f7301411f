//! Multi-substance stack simulation on a shared timeline.
//!
//! Every slot is allocated up front; each valid dose is then folded into
//! the slots at or after its start time. The fold runs in a canonical
//! order so the result does not depend on how the stack was listed.
//!
//! Invalid entries never abort a run: they are logged, reported in
//! [`StackReport::skipped`], and left out of the timeline and risks.

use crate::clearance::{half_life_of, DecayModel};
use crate::clock::ClockTime;
use crate::config::{Config, StackConfig};
use crate::risk::{detect_dose_limits, detect_sleep_disruption};
use crate::types::round_to;
use crate::{DoseEvent, Error, Result, RiskEvent, StackEntry, SubstanceProfile, TimelineSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stack entry that was left out of the simulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    /// Position in the input stack
    pub index: usize,
    pub substance: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackReport {
    pub input_count: usize,
    pub processed_count: usize,
    pub skipped: Vec<SkippedEntry>,
    pub timeline: Vec<TimelineSlot>,
    pub risks: Vec<RiskEvent>,
}

/// A validated entry with everything needed to compute its decay
#[derive(Clone, Debug)]
struct Contribution<'a> {
    event: DoseEvent,
    profile: &'a SubstanceProfile,
    half_life_hours: f64,
    weight_kg: f64,
}

impl Contribution<'_> {
    fn model(&self) -> DecayModel {
        let vd = self.profile.volume_of_distribution_per_kg * self.weight_kg;
        DecayModel::new(self.event.dose_mg, self.half_life_hours, vd)
    }
}

/// Allocate the empty timeline
pub fn build_timeline(config: &StackConfig) -> Vec<TimelineSlot> {
    (0..config.slot_count)
        .map(|i| TimelineSlot::new(i as f64 * config.slot_step_hours))
        .collect()
}

/// Simulate a stack of doses over one day
pub fn simulate_stack(
    entries: &[StackEntry],
    profiles: &BTreeMap<String, SubstanceProfile>,
    config: &Config,
) -> StackReport {
    tracing::info!("Simulating stack of {} entries", entries.len());

    let mut contributions = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry, profiles, &config.stack) {
            Ok(contribution) => contributions.push(contribution),
            Err(e) => {
                tracing::warn!("Skipping stack entry {} ({}): {}", index, entry.substance, e);
                skipped.push(SkippedEntry {
                    index,
                    substance: entry.substance.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    contributions.sort_by(canonical_order);

    let mut timeline = build_timeline(&config.stack);
    for contribution in &contributions {
        apply_contribution(&mut timeline, contribution, &config.stack);
    }
    for slot in &mut timeline {
        for mg in slot.per_substance_mg.values_mut() {
            *mg = round_to(*mg, 2);
        }
    }

    let doses: Vec<DoseEvent> = contributions.iter().map(|c| c.event.clone()).collect();
    let mut risks = Vec::new();
    risks.extend(detect_sleep_disruption(&mut timeline, &config.risk));
    risks.extend(detect_dose_limits(&doses, profiles));

    tracing::info!(
        "Stack simulation complete: {} processed, {} skipped, {} risks",
        contributions.len(),
        skipped.len(),
        risks.len()
    );

    StackReport {
        input_count: entries.len(),
        processed_count: contributions.len(),
        skipped,
        timeline,
        risks,
    }
}

fn validate_entry<'a>(
    entry: &StackEntry,
    profiles: &'a BTreeMap<String, SubstanceProfile>,
    config: &StackConfig,
) -> Result<Contribution<'a>> {
    let profile = profiles
        .get(&entry.substance)
        .ok_or_else(|| Error::MissingSubstanceProfile(entry.substance.clone()))?;
    check_profile(profile)?;

    let phenotype = entry
        .phenotype
        .as_ref()
        .ok_or_else(|| Error::MissingPhenotype(entry.substance.clone()))?;

    if !entry.dose_mg.is_finite() || entry.dose_mg <= 0.0 {
        return Err(Error::InvalidDoseAmount(format!("{}", entry.dose_mg)));
    }

    let start = match entry.start.as_deref() {
        Some(s) => ClockTime::parse(s)?,
        None => ClockTime::MIDNIGHT,
    };

    let half_life_hours = half_life_of(phenotype).unwrap_or_else(|| {
        tracing::debug!(
            "{} phenotype {:?} has no half-life, using {}h",
            entry.substance,
            phenotype.phenotype_label,
            config.fallback_half_life_hours
        );
        config.fallback_half_life_hours
    });

    let weight_kg = entry
        .weight_kg
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(config.default_weight_kg);

    Ok(Contribution {
        event: DoseEvent {
            substance: entry.substance.clone(),
            dose_mg: entry.dose_mg,
            start,
        },
        profile,
        half_life_hours,
        weight_kg,
    })
}

/// A profile must give a positive, finite Vd and finite axis effects
fn check_profile(profile: &SubstanceProfile) -> Result<()> {
    let vd = profile.volume_of_distribution_per_kg;
    if !vd.is_finite() || vd <= 0.0 {
        return Err(Error::InvalidSubstanceProfile(format!(
            "{} has volume of distribution {}",
            profile.name, vd
        )));
    }

    let effects = &profile.axis_effects;
    if ![effects.neuro, effects.detox, effects.drug_load]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(Error::InvalidSubstanceProfile(format!(
            "{} has non-finite axis effects",
            profile.name
        )));
    }
    Ok(())
}

/// Total order over contributions; equal keys produce identical sums
fn canonical_order(a: &Contribution<'_>, b: &Contribution<'_>) -> std::cmp::Ordering {
    a.event
        .substance
        .cmp(&b.event.substance)
        .then_with(|| a.event.start.cmp(&b.event.start))
        .then_with(|| a.event.dose_mg.total_cmp(&b.event.dose_mg))
        .then_with(|| a.half_life_hours.total_cmp(&b.half_life_hours))
        .then_with(|| a.weight_kg.total_cmp(&b.weight_kg))
}

/// Fold one dose into every slot at or after its start
fn apply_contribution(timeline: &mut [TimelineSlot], contribution: &Contribution<'_>, config: &StackConfig) {
    let model = contribution.model();
    let start_hours = contribution.event.start.hours();
    let dose_mg = contribution.event.dose_mg;
    let effects = &contribution.profile.axis_effects;

    for slot in timeline.iter_mut().filter(|s| s.hour_offset >= start_hours) {
        let remaining = model.remaining_mg_at(slot.hour_offset - start_hours);

        // Slots ascend in time and remaining mg only falls from here
        if remaining <= config.negligible_mg {
            break;
        }

        *slot
            .per_substance_mg
            .entry(contribution.event.substance.clone())
            .or_insert(0.0) += remaining;
        slot.axis_totals.add_weighted(effects, remaining / dose_mg);
    }
}
