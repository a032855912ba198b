//! CSV reports of the herd and its health history.
//!
//! Reports are output only. Each file is written to a temp file next to the
//! target, synced, then renamed over it, so a reader never sees a partial
//! report.

use crate::metrics::{average_daily_gain, latest_weight, registration_tag};
use crate::{AnimalRecord, Error, HealthLogEntry, RecordStore, Result};
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One animal per row
#[derive(Debug, serde::Serialize)]
struct HerdRow {
    id: String,
    official_id: Option<String>,
    birth_date: String,
    mother: String,
    sex: String,
    status: String,
    registration: String,
    birth_weight: f64,
    current_weight: f64,
    latest_weight: f64,
    latest_weight_source: String,
    latest_weight_date: String,
    adg: String,
    weaning_date: Option<String>,
    weaning_weight: Option<f64>,
    periodic_weights: usize,
    navel_disinfected: bool,
    colostrum: String,
    feces: String,
    disease: String,
}

impl HerdRow {
    fn new(record: &AnimalRecord, now: NaiveDateTime, threshold_days: i64) -> Self {
        let latest = latest_weight(record);
        HerdRow {
            id: record.id.clone(),
            official_id: record.official_id.clone(),
            birth_date: record.birth_date.format(DATE_FORMAT).to_string(),
            mother: record.mother.clone(),
            sex: record.sex.to_string(),
            status: record.status.to_string(),
            registration: registration_tag(record, now, threshold_days).to_string(),
            birth_weight: record.birth_weight,
            current_weight: record.current_weight,
            latest_weight: latest.weight,
            latest_weight_source: latest.source.to_string(),
            latest_weight_date: latest.date.format(DATE_FORMAT).to_string(),
            adg: format!("{:.3}", average_daily_gain(record, now)),
            weaning_date: record
                .weaning
                .as_ref()
                .map(|w| w.date.format(DATE_FORMAT).to_string()),
            weaning_weight: record.weaning.as_ref().map(|w| w.weight),
            periodic_weights: record.periodic_weights.len(),
            navel_disinfected: record.navel_disinfected,
            colostrum: record.colostrum.to_string(),
            feces: record.feces_state.to_string(),
            disease: record.disease_status.to_string(),
        }
    }
}

/// One health log entry per row
#[derive(Debug, serde::Serialize)]
struct HealthRow {
    entry_id: String,
    animal_id: String,
    timestamp: String,
    kind: String,
    detail: String,
}

impl From<&HealthLogEntry> for HealthRow {
    fn from(entry: &HealthLogEntry) -> Self {
        HealthRow {
            entry_id: entry.entry_id.to_string(),
            animal_id: entry.animal_id.clone(),
            timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            kind: entry.event.kind().to_string(),
            detail: entry.event.detail(),
        }
    }
}

/// Write every animal, in registration order, to a CSV file
///
/// Returns the number of rows written.
pub fn write_herd_report(
    store: &RecordStore,
    path: &Path,
    now: NaiveDateTime,
    threshold_days: i64,
) -> Result<usize> {
    let count = write_atomically(path, |writer| {
        for record in store.animals() {
            writer.serialize(HerdRow::new(record, now, threshold_days))?;
        }
        Ok(store.animals().len())
    })?;
    tracing::info!("Wrote {} animals to {:?}", count, path);
    Ok(count)
}

/// Write the health log, oldest entry first, to a CSV file
pub fn write_health_report(store: &RecordStore, path: &Path) -> Result<usize> {
    let mut entries: Vec<&HealthLogEntry> = store.health_log().iter().collect();
    entries.sort_by_key(|e| e.timestamp);

    let count = write_atomically(path, |writer| {
        for entry in &entries {
            writer.serialize(HealthRow::from(*entry))?;
        }
        Ok(entries.len())
    })?;
    tracing::info!("Wrote {} health entries to {:?}", count, path);
    Ok(count)
}

fn write_atomically<F>(path: &Path, write_rows: F) -> Result<usize>
where
    F: FnOnce(&mut csv::Writer<&File>) -> Result<usize>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    let count = {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        let count = write_rows(&mut writer)?;
        writer.flush()?;
        count
    };

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(count)
}
