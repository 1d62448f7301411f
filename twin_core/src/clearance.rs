//! Single-substance clearance curve using first-order elimination.
//!
//! ```text
//! k  = ln(2) / half_life
//! Vd = coefficient_per_kg × weight_kg
//! C(t) = (dose / Vd) × e^(−k·t),  remaining(t) = C(t) × Vd
//! ```
//!
//! Unlike the stack simulator, this path is strict: any invalid input
//! aborts the call.

use crate::clock::ClockTime;
use crate::config::ClearanceConfig;
use crate::genotype::lookup_genotype;
use crate::types::round_to;
use crate::{Error, GenotypeTable, PhenotypeProfile, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// First-order elimination of one dose
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayModel {
    pub half_life_hours: f64,
    /// Elimination rate constant (1/h)
    pub k: f64,
    /// Volume of distribution (L)
    pub vd_litres: f64,
    /// Initial concentration (mg/L)
    pub c0: f64,
}

impl DecayModel {
    pub fn new(dose_mg: f64, half_life_hours: f64, vd_litres: f64) -> Self {
        Self {
            half_life_hours,
            k: std::f64::consts::LN_2 / half_life_hours,
            vd_litres,
            c0: dose_mg / vd_litres,
        }
    }

    pub fn concentration_at(&self, hours: f64) -> f64 {
        self.c0 * (-self.k * hours).exp()
    }

    pub fn remaining_mg_at(&self, hours: f64) -> f64 {
        self.concentration_at(hours) * self.vd_litres
    }
}

/// Half-life of a phenotype, if it carries a usable one
pub fn half_life_of(phenotype: &PhenotypeProfile) -> Option<f64> {
    phenotype
        .half_life_hours
        .filter(|h| h.is_finite() && *h > 0.0)
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClearanceStatus {
    Active,
    Cleared,
}

/// One hourly sample of a clearance curve
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecayPoint {
    pub hour_offset: u32,
    pub label: String,
    /// mg/L, rounded to 2 decimals
    pub concentration: f64,
    /// mg, rounded to 2 decimals
    pub remaining_mg: f64,
    pub status: ClearanceStatus,
}

/// Restartable hourly clearance curve
///
/// Cloning yields an independent iterator from the same position.
#[derive(Clone, Debug)]
pub struct ClearanceCurve {
    model: DecayModel,
    start: ClockTime,
    cleared_threshold_mg: f64,
    negligible_mg: f64,
    horizon_hours: u32,
    next_hour: u32,
    finished: bool,
}

impl ClearanceCurve {
    /// Validate inputs and build the curve
    pub fn new(
        dose_mg: f64,
        weight_kg: f64,
        phenotype: &PhenotypeProfile,
        start: ClockTime,
        config: &ClearanceConfig,
    ) -> Result<Self> {
        if !dose_mg.is_finite() || dose_mg <= 0.0 {
            return Err(Error::InvalidDoseAmount(format!("{}", dose_mg)));
        }
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(Error::InvalidBodyWeight(format!("{}", weight_kg)));
        }
        let half_life = half_life_of(phenotype)
            .ok_or_else(|| Error::InvalidPhenotype(phenotype.phenotype_label.clone()))?;

        let vd = config.distribution_coefficient_per_kg * weight_kg;

        Ok(Self {
            model: DecayModel::new(dose_mg, half_life, vd),
            start,
            cleared_threshold_mg: config.cleared_threshold_mg,
            negligible_mg: config.negligible_mg,
            horizon_hours: config.horizon_hours,
            next_hour: 0,
            finished: false,
        })
    }

    pub fn model(&self) -> &DecayModel {
        &self.model
    }

    /// A fresh iterator from hour 0
    pub fn restart(&self) -> Self {
        Self {
            next_hour: 0,
            finished: false,
            ..self.clone()
        }
    }
}

impl Iterator for ClearanceCurve {
    type Item = DecayPoint;

    fn next(&mut self) -> Option<DecayPoint> {
        if self.finished || self.next_hour > self.horizon_hours {
            return None;
        }

        let t = self.next_hour;
        let concentration = self.model.concentration_at(f64::from(t));
        let remaining = concentration * self.model.vd_litres;

        // The point that crosses the negligible level is still emitted
        if remaining < self.negligible_mg {
            self.finished = true;
        }
        self.next_hour += 1;

        Some(DecayPoint {
            hour_offset: t,
            label: self.start.label_after(f64::from(t)),
            concentration: round_to(concentration, 2),
            remaining_mg: round_to(remaining, 2),
            status: if remaining < self.cleared_threshold_mg {
                ClearanceStatus::Cleared
            } else {
                ClearanceStatus::Active
            },
        })
    }
}

/// When a dose first drops below the cleared threshold
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CrashTime {
    #[serde(rename_all = "camelCase")]
    At { hour_offset: u32, label: String },
    BeyondHorizon,
}

impl CrashTime {
    /// First cleared point of a curve
    pub fn from_curve(curve: &[DecayPoint]) -> Self {
        curve
            .iter()
            .find(|p| p.status == ClearanceStatus::Cleared)
            .map(|p| CrashTime::At {
                hour_offset: p.hour_offset,
                label: p.label.clone(),
            })
            .unwrap_or(CrashTime::BeyondHorizon)
    }

    pub fn label(&self, horizon_hours: u32) -> String {
        match self {
            CrashTime::At { label, .. } => label.clone(),
            CrashTime::BeyondHorizon => format!("More than {}h", horizon_hours),
        }
    }
}

impl PartialOrd for CrashTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CrashTime {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CrashTime::At { hour_offset: a, .. }, CrashTime::At { hour_offset: b, .. }) => a.cmp(b),
            (CrashTime::At { .. }, CrashTime::BeyondHorizon) => Ordering::Less,
            (CrashTime::BeyondHorizon, CrashTime::At { .. }) => Ordering::Greater,
            (CrashTime::BeyondHorizon, CrashTime::BeyondHorizon) => Ordering::Equal,
        }
    }
}

/// Single-substance request keyed by genotype label
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceRequest {
    pub dose_mg: f64,
    pub weight_kg: f64,
    pub genotype: String,
    /// "HH:MM"
    pub start: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceReport {
    pub phenotype_label: String,
    pub half_life_hours: f64,
    pub recommendation: String,
    pub crash_time: CrashTime,
    pub curve: Vec<DecayPoint>,
}

/// Resolve the genotype and compute the full clearance curve
///
/// Fails on an unknown genotype, a phenotype without half-life, or an
/// invalid dose, weight, or start time.
pub fn calculate_clearance(
    request: &ClearanceRequest,
    genotypes: &GenotypeTable,
    config: &ClearanceConfig,
) -> Result<ClearanceReport> {
    let phenotype = lookup_genotype(genotypes, &request.genotype)?;
    let start = ClockTime::parse(&request.start)?;

    let curve = ClearanceCurve::new(
        request.dose_mg,
        request.weight_kg,
        &phenotype,
        start,
        config,
    )?;
    let half_life_hours = curve.model().half_life_hours;
    let points: Vec<DecayPoint> = curve.collect();
    let crash_time = CrashTime::from_curve(&points);

    tracing::info!(
        "Clearance for genotype {} ({}): {} points, crash {}",
        request.genotype,
        phenotype.phenotype_label,
        points.len(),
        crash_time.label(config.horizon_hours)
    );

    Ok(ClearanceReport {
        phenotype_label: phenotype.phenotype_label,
        half_life_hours,
        recommendation: phenotype.recommendation,
        crash_time,
        curve: points,
    })
}
