//! CSV export of clearance curves, stack timelines and forecasts.
//!
//! Each writer takes any `io::Write` and emits a header row; the `*_file`
//! variants create parent directories and sync the file before returning.

use crate::clearance::{ClearanceStatus, DecayPoint};
use crate::prognosis::Checkpoint;
use crate::{Result, TimelineSlot};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, serde::Serialize)]
struct CurveRow<'a> {
    hour_offset: u32,
    label: &'a str,
    concentration_mg_per_l: f64,
    remaining_mg: f64,
    status: &'static str,
}

impl<'a> From<&'a DecayPoint> for CurveRow<'a> {
    fn from(point: &'a DecayPoint) -> Self {
        CurveRow {
            hour_offset: point.hour_offset,
            label: &point.label,
            concentration_mg_per_l: point.concentration,
            remaining_mg: point.remaining_mg,
            status: match point.status {
                ClearanceStatus::Active => "Active",
                ClearanceStatus::Cleared => "Cleared",
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct TimelineRow<'a> {
    hour_offset: f64,
    label: &'a str,
    neuro: f64,
    detox: f64,
    drug_load: f64,
    /// JSON object of substance to remaining mg
    substances: String,
    events: String,
}

impl<'a> TryFrom<&'a TimelineSlot> for TimelineRow<'a> {
    type Error = crate::Error;

    fn try_from(slot: &'a TimelineSlot) -> Result<Self> {
        Ok(TimelineRow {
            hour_offset: slot.hour_offset,
            label: &slot.label,
            neuro: slot.axis_totals.neuro,
            detox: slot.axis_totals.detox,
            drug_load: slot.axis_totals.drug_load,
            substances: serde_json::to_string(&slot.per_substance_mg)?,
            events: slot.events.join(";"),
        })
    }
}

#[derive(Debug, serde::Serialize)]
struct CheckpointRow {
    date: String,
    year: u32,
    liver_health: f64,
    neuro_health: f64,
    cardio_health: f64,
}

impl From<&Checkpoint> for CheckpointRow {
    fn from(checkpoint: &Checkpoint) -> Self {
        CheckpointRow {
            date: checkpoint.date.format("%Y-%m-%d").to_string(),
            year: checkpoint.year,
            liver_health: checkpoint.liver_health,
            neuro_health: checkpoint.neuro_health,
            cardio_health: checkpoint.cardio_health,
        }
    }
}

pub fn write_curve<W: Write>(writer: W, curve: &[DecayPoint]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in curve {
        csv.serialize(CurveRow::from(point))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_timeline<W: Write>(writer: W, timeline: &[TimelineSlot]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for slot in timeline {
        csv.serialize(TimelineRow::try_from(slot)?)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_checkpoints<W: Write>(writer: W, checkpoints: &[Checkpoint]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for checkpoint in checkpoints {
        csv.serialize(CheckpointRow::from(checkpoint))?;
    }
    csv.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

fn export_to_file<F>(path: &Path, rows: usize, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut file = create_file(path)?;
    write(&mut file)?;
    file.sync_all()?;
    tracing::info!("Wrote {} rows to {:?}", rows, path);
    Ok(())
}

pub fn write_curve_file(path: &Path, curve: &[DecayPoint]) -> Result<()> {
    export_to_file(path, curve.len(), |file| write_curve(file, curve))
}

pub fn write_timeline_file(path: &Path, timeline: &[TimelineSlot]) -> Result<()> {
    export_to_file(path, timeline.len(), |file| write_timeline(file, timeline))
}

pub fn write_checkpoints_file(path: &Path, checkpoints: &[Checkpoint]) -> Result<()> {
    export_to_file(path, checkpoints.len(), |file| write_checkpoints(file, checkpoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn point(hour: u32, remaining: f64, status: ClearanceStatus) -> DecayPoint {
        DecayPoint {
            hour_offset: hour,
            label: format!("{}:00 AM", hour),
            concentration: remaining / 42.0,
            remaining_mg: remaining,
            status,
        }
    }

    #[test]
    fn test_curve_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_curve(
            &mut buf,
            &[
                point(1, 65.0, ClearanceStatus::Active),
                point(2, 8.0, ClearanceStatus::Cleared),
            ],
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "hour_offset,label,concentration_mg_per_l,remaining_mg,status"
        );
        assert!(lines[2].ends_with(",8.0,Cleared"));
    }

    #[test]
    fn test_timeline_csv_serializes_substances() {
        let mut slot = TimelineSlot::new(23.0);
        slot.per_substance_mg.insert("Caffeine".into(), 27.26);
        slot.events.push("Sleep Risk".into());

        let mut buf = Vec::new();
        write_timeline(&mut buf, &[slot]).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(5), Some("substances"));

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(1), Some("11:00 PM"));
        assert_eq!(record.get(5), Some(r#"{"Caffeine":27.26}"#));
        assert_eq!(record.get(6), Some("Sleep Risk"));
    }

    #[test]
    fn test_checkpoints_file_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("forecast.csv");

        let checkpoints = vec![Checkpoint {
            date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            year: 1,
            liver_health: 100.0,
            neuro_health: 85.0,
            cardio_health: 90.0,
        }];
        write_checkpoints_file(&path, &checkpoints).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("date,year,liver_health,neuro_health,cardio_health"));
        assert!(contents.contains("2025-01-31,1,100.0,85.0,90.0"));
    }
}
