//! `soberstats log` subcommand for recording or editing a day

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::services::AppContext;
use crate::types::{
    find_medication, parse_date, DailyLog, Result, SoberError, TakenMedication, DEFAULT_MOOD,
    OTHER_MEDICATION_ID,
};

/// One `--med` value: `ID:AMOUNT[:CUSTOM][@HH:MM][#REASON]`
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationArg(pub TakenMedication);

impl FromStr for MedicationArg {
    type Err = SoberError;

    fn from_str(s: &str) -> Result<Self> {
        let (rest, reason) = match s.split_once('#') {
            Some((rest, reason)) => (rest, Some(reason.trim().to_string())),
            None => (s, None),
        };
        let (rest, time) = match rest.rsplit_once('@') {
            Some((rest, time)) => (rest, Some(time.trim().to_string())),
            None => (rest, None),
        };

        let mut parts = rest.splitn(3, ':');
        let id = parts.next().unwrap_or_default().trim().to_lowercase();
        let amount = parts
            .next()
            .ok_or_else(|| SoberError::Invalid(format!("missing amount in {:?} (expected ID:AMOUNT)", s)))?
            .trim()
            .parse::<f64>()
            .map_err(|e| SoberError::Invalid(format!("bad amount in {:?}: {}", s, e)))?;
        let custom = parts.next().map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        if find_medication(&id).is_none() {
            return Err(SoberError::Invalid(format!(
                "unknown medication {:?} (see `soberstats reference`)",
                id
            )));
        }

        let mut med = TakenMedication::new(id, amount);
        if med.medication_id == OTHER_MEDICATION_ID {
            med.custom_name = custom;
        } else if custom.is_some() {
            return Err(SoberError::Invalid(format!(
                "a custom name is only allowed for `{}`",
                OTHER_MEDICATION_ID
            )));
        }
        med.time_taken = time;
        med.reason = reason.filter(|r| !r.is_empty());
        med.validate()?;
        Ok(MedicationArg(med))
    }
}

/// Record or edit the log for a date
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Date to log (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<String>,

    /// Alcohol units consumed (0 records an alcohol-free day)
    #[arg(long, value_name = "UNITS")]
    pub alcohol: Option<f64>,

    /// Add a medication: ID:AMOUNT[:CUSTOM][@HH:MM][#REASON]
    #[arg(long = "med", value_name = "MED")]
    pub meds: Vec<MedicationArg>,

    /// Drop medications already recorded for the day
    #[arg(long)]
    pub clear_meds: bool,

    /// Mood from 1 (worst) to 10 (best)
    #[arg(long)]
    pub mood: Option<u8>,

    /// Free-text notes (empty string clears)
    #[arg(long)]
    pub notes: Option<String>,

    /// Output the saved log as JSON
    #[arg(long)]
    pub json: bool,
}

impl LogArgs {
    /// Apply the arguments to the day's existing log (or a fresh one)
    fn build(self, logs: &[DailyLog], today: NaiveDate, now_time: &str) -> Result<DailyLog> {
        let date = match &self.date {
            Some(d) => parse_date(d)?,
            None => today,
        };

        let mut log = logs
            .iter()
            .find(|l| l.date == date)
            .cloned()
            .unwrap_or_else(|| DailyLog::new(date));

        if let Some(units) = self.alcohol {
            log.alcohol_consumed = units > 0.0;
            log.alcohol_units = if log.alcohol_consumed { units } else { 0.0 };
        }

        if self.clear_meds {
            log.medications.clear();
        }
        for MedicationArg(mut med) in self.meds {
            if med.time_taken.is_none() {
                med.time_taken = Some(now_time.to_string());
            }
            log.medications.push(med);
        }

        if let Some(mood) = self.mood {
            log.mood = Some(mood);
        } else if log.mood.is_none() {
            log.mood = Some(DEFAULT_MOOD);
        }

        if let Some(notes) = self.notes {
            log.notes = (!notes.is_empty()).then_some(notes);
        }

        log.touch();
        log.validate()?;
        Ok(log)
    }

    pub async fn run(self, ctx: &mut AppContext) -> Result<()> {
        let json = self.json;
        let logs = ctx.logs().await?;
        let now = Local::now();
        let log = self.build(&logs, now.date_naive(), &now.format("%H:%M").to_string())?;
        let editing = logs.iter().any(|l| l.id == log.id);

        ctx.save_log(&log).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&log)?);
        } else {
            let verb = if editing { "Updated" } else { "Logged" };
            println!(
                "{} {}: alcohol {}, {} medication(s), mood {}",
                verb,
                log.date,
                if log.alcohol_consumed {
                    format!("{} units", log.alcohol_units)
                } else {
                    "none".to_string()
                },
                log.medications.len(),
                log.effective_mood()
            );
        }
        Ok(())
    }
}
