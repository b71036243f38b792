//! CSV export of all logs

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::types::{DailyLog, Result, SoberError, TakenMedication};

pub const CSV_HEADERS: [&str; 7] = [
    "Date",
    "Timestamp_Epoch",
    "Mood_1_10",
    "Alcohol_Consumed",
    "Alcohol_Units",
    "Notes",
    "Medications_Summary",
];

/// Quote a text field, doubling internal quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// `[HH:MM] name amountmg (Reason: text)`, absent parts omitted
fn medication_fragment(med: &TakenMedication) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(time) = &med.time_taken {
        parts.push(format!("[{}]", time));
    }
    parts.push(match &med.custom_name {
        Some(name) => format!("{}(Other)", name),
        None => med.medication_id.clone(),
    });
    parts.push(format!("{}mg", med.amount));
    if let Some(reason) = med.reason.as_deref().filter(|r| !r.is_empty()) {
        parts.push(format!("(Reason: {})", reason));
    }
    parts.join(" ")
}

fn csv_row(log: &DailyLog) -> String {
    let meds = log
        .medications
        .iter()
        .map(medication_fragment)
        .collect::<Vec<_>>()
        .join("; ");

    [
        log.date.to_string(),
        log.timestamp.to_string(),
        log.mood.map(|m| m.to_string()).unwrap_or_default(),
        if log.alcohol_consumed { "YES" } else { "NO" }.to_string(),
        log.alcohol_units.to_string(),
        quote(log.notes.as_deref().unwrap_or("")),
        quote(&meds),
    ]
    .join(",")
}

/// Render logs (in the given order) as CSV text
pub fn to_csv(logs: &[DailyLog]) -> String {
    let mut lines = Vec::with_capacity(logs.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    lines.extend(logs.iter().map(csv_row));
    lines.join("\n")
}

/// `soberstats_export_YYYY-MM-DD.csv`
pub fn default_export_name(today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("soberstats_export_{}.csv", today.format("%Y-%m-%d")))
}

/// Write the CSV file; refuses to write an empty export
pub fn write_csv(logs: &[DailyLog], path: &Path) -> Result<()> {
    if logs.is_empty() {
        return Err(SoberError::Invalid("nothing to export: no logs recorded".into()));
    }
    fs::write(path, to_csv(logs))?;
    tracing::info!(path = %path.display(), rows = logs.len(), "exported logs");
    Ok(())
}
