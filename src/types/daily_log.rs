//! Daily log records

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, SoberError};
use super::medication::OTHER_MEDICATION_ID;

/// Mood used in averages when a log has none recorded
pub const DEFAULT_MOOD: u8 = 5;

/// One dose event within a daily log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TakenMedication {
    /// Catalog id or "other"
    pub medication_id: String,
    pub amount: f64,
    /// HH:MM, 24h
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<String>,
    /// Only meaningful when medication_id is "other"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TakenMedication {
    pub fn new(medication_id: impl Into<String>, amount: f64) -> Self {
        Self {
            medication_id: medication_id.into(),
            amount,
            time_taken: None,
            custom_name: None,
            reason: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0.0 || !self.amount.is_finite() {
            return Err(SoberError::Invalid(format!(
                "dose for {} must be a positive number",
                self.medication_id
            )));
        }
        if let Some(time) = &self.time_taken {
            NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
                SoberError::Invalid(format!("time taken must be HH:MM, got {:?}", time))
            })?;
        }
        if self.custom_name.is_some() && self.medication_id != OTHER_MEDICATION_ID {
            return Err(SoberError::Invalid(
                "custom name is only allowed for \"other\" medications".into(),
            ));
        }
        Ok(())
    }
}

/// One record per calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: String,
    pub date: NaiveDate,
    pub alcohol_consumed: bool,
    /// May be stale when alcohol_consumed is false; use `effective_alcohol_units`
    #[serde(default)]
    pub alcohol_units: f64,
    #[serde(default)]
    pub medications: Vec<TakenMedication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    /// Epoch millis of `date` at UTC midnight, secondary sort aid only
    #[serde(default)]
    pub timestamp: i64,
}

impl DailyLog {
    /// Fresh record for a date with a newly generated id
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            alcohol_consumed: false,
            alcohol_units: 0.0,
            medications: Vec::new(),
            notes: None,
            mood: None,
            timestamp: timestamp_for(date),
        }
    }

    /// Alcohol units with the zero-if-not-consumed rule applied
    pub fn effective_alcohol_units(&self) -> f64 {
        if self.alcohol_consumed {
            self.alcohol_units
        } else {
            0.0
        }
    }

    /// Mood with absent values counted as the midpoint
    pub fn effective_mood(&self) -> u8 {
        self.mood.unwrap_or(DEFAULT_MOOD)
    }

    /// Total dose of one medication across all entries of this log
    pub fn dose_of(&self, medication_id: &str) -> f64 {
        self.medications
            .iter()
            .filter(|m| m.medication_id == medication_id)
            .map(|m| m.amount)
            .sum()
    }

    /// Amount of the first entry for a medication, 0 when there is none
    pub fn first_dose_of(&self, medication_id: &str) -> f64 {
        self.medications
            .iter()
            .find(|m| m.medication_id == medication_id)
            .map_or(0.0, |m| m.amount)
    }

    /// Refresh the derived timestamp from `date`
    pub fn touch(&mut self) {
        self.timestamp = timestamp_for(self.date);
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(mood) = self.mood {
            if !(1..=10).contains(&mood) {
                return Err(SoberError::Invalid(format!(
                    "mood must be between 1 and 10, got {}",
                    mood
                )));
            }
        }
        if self.alcohol_units < 0.0 || !self.alcohol_units.is_finite() {
            return Err(SoberError::Invalid(
                "alcohol units must be a non-negative number".into(),
            ));
        }
        for med in &self.medications {
            med.validate()?;
        }
        Ok(())
    }
}

/// Epoch millis for a date at UTC midnight
pub fn timestamp_for(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Sort newest date first; equal dates keep their relative order
pub fn sort_newest_first(logs: &mut [DailyLog]) {
    logs.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| SoberError::Invalid(format!("date must be YYYY-MM-DD, got {:?}", s)))
}
