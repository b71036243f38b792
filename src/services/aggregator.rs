//! Aggregation of daily logs into chart rows, peaks and trends
//!
//! Everything here is pure: inputs are borrowed, never mutated, and the
//! whole result is recomputed from the full collection on every change.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::types::{medication_index, sort_newest_first, DailyLog, MEDICATIONS};

/// Number of most recent logs in one trend period
pub const PERIOD_LEN: usize = 7;

/// Minimum change in period average that counts as a trend
pub const TREND_EPSILON: f64 = 0.05;

/// Time bucket size for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Yearly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Daily => "Day",
            Granularity::Weekly => "Week",
            Granularity::Monthly => "Month",
            Granularity::Yearly => "Year",
        }
    }

    /// Bucket key for a date
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Daily => date.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let week = date.iso_week();
                format!("{}-W{}", week.year(), week.week())
            }
            Granularity::Monthly => date.format("%Y-%m").to_string(),
            Granularity::Yearly => date.format("%Y").to_string(),
        }
    }
}

/// Per-medication value inside a bucket row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MedicationAmount {
    pub medication_id: &'static str,
    pub amount: f64,
    /// Joined reasons, daily rows only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<String>,
}

/// One chart row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BucketRow {
    /// Display label ("03-09" for daily, the key otherwise)
    pub label: String,
    pub key: String,
    pub count: usize,
    pub alcohol_units: f64,
    pub mood: f64,
    /// One entry per catalog medication, catalog order
    pub medications: Vec<MedicationAmount>,
}

impl BucketRow {
    pub fn amount(&self, medication_id: &str) -> f64 {
        self.medications
            .iter()
            .find(|m| m.medication_id == medication_id)
            .map(|m| m.amount)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeakRecord {
    pub medication_id: &'static str,
    pub peak_amount: f64,
    pub peak_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    /// Classify the change between two period averages
    pub fn classify(current: f64, previous: f64) -> Self {
        let diff = current - previous;
        if diff > TREND_EPSILON {
            TrendDirection::Up
        } else if diff < -TREND_EPSILON {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TrendDirection::Up => "▲",
            TrendDirection::Down => "▼",
            TrendDirection::Flat => "─",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendRecord {
    pub medication_id: &'static str,
    pub current_avg: f64,
    pub previous_avg: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MedicationAverage {
    pub medication_id: &'static str,
    pub average: f64,
}

/// Values shown on the dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub logged_today: bool,
    pub alcohol_free_streak: usize,
    pub top_medication: Option<MedicationAverage>,
    /// Non-zero 7-log averages, highest first
    pub recent_averages: Vec<MedicationAverage>,
    pub trends: Vec<TrendRecord>,
}

/// Round half away from zero to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Default)]
struct BucketAcc {
    count: usize,
    alcohol_sum: f64,
    mood_sum: f64,
    doses: Vec<f64>,
    reasons: Vec<Vec<String>>,
}

impl BucketAcc {
    fn new() -> Self {
        Self {
            doses: vec![0.0; MEDICATIONS.len()],
            reasons: vec![Vec::new(); MEDICATIONS.len()],
            ..Default::default()
        }
    }

    fn add(&mut self, log: &DailyLog) {
        self.count += 1;
        self.alcohol_sum += log.effective_alcohol_units();
        self.mood_sum += f64::from(log.effective_mood());

        for med in &log.medications {
            let Some(idx) = medication_index(&med.medication_id) else {
                continue;
            };
            self.doses[idx] += med.amount;
            if let Some(reason) = med.reason.as_deref().map(str::trim) {
                if !reason.is_empty() {
                    self.reasons[idx].push(reason.to_string());
                }
            }
        }
    }

    fn into_row(self, key: String, granularity: Granularity) -> BucketRow {
        let daily = granularity == Granularity::Daily;
        let divisor = if daily { 1.0 } else { self.count as f64 };

        let medications = MEDICATIONS
            .iter()
            .zip(self.doses)
            .zip(self.reasons)
            .map(|((med, dose), reasons)| MedicationAmount {
                medication_id: med.id,
                amount: round_to(dose / divisor, 2),
                reasons: (daily && !reasons.is_empty()).then(|| reasons.join("; ")),
            })
            .collect();

        let label = if daily {
            key.get(5..).unwrap_or(&key).to_string()
        } else {
            key.clone()
        };

        BucketRow {
            label,
            key,
            count: self.count,
            alcohol_units: round_to(self.alcohol_sum / divisor, 1),
            mood: round_to(self.mood_sum / self.count as f64, 1),
            medications,
        }
    }
}

/// Aggregator for chart rows, peaks, trends and dashboard values
pub struct Aggregator;

impl Aggregator {
    /// Group logs into chronological buckets
    pub fn aggregate(logs: &[DailyLog], granularity: Granularity) -> Vec<BucketRow> {
        let mut sorted: Vec<&DailyLog> = logs.iter().collect();
        sorted.sort_by_key(|l| l.date);

        let mut order: Vec<(String, BucketAcc)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for log in sorted {
            let key = granularity.bucket_key(log.date);
            let slot = match index.get(&key) {
                Some(&i) => i,
                None => {
                    index.insert(key.clone(), order.len());
                    order.push((key, BucketAcc::new()));
                    order.len() - 1
                }
            };
            order[slot].1.add(log);
        }

        order
            .into_iter()
            .map(|(key, acc)| acc.into_row(key, granularity))
            .collect()
    }

    /// Highest same-day total per medication; earliest date wins ties
    pub fn peaks(logs: &[DailyLog]) -> Vec<PeakRecord> {
        // BTreeMap keeps the scan chronological
        let mut daily: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for log in logs {
            let sums = daily
                .entry(log.date)
                .or_insert_with(|| vec![0.0; MEDICATIONS.len()]);
            for med in &log.medications {
                if let Some(idx) = medication_index(&med.medication_id) {
                    sums[idx] += med.amount;
                }
            }
        }

        let mut best: Vec<Option<(f64, NaiveDate)>> = vec![None; MEDICATIONS.len()];
        for (date, sums) in &daily {
            for (idx, &amount) in sums.iter().enumerate() {
                let beats = match best[idx] {
                    None => amount > 0.0,
                    Some((peak, _)) => amount > peak,
                };
                if beats {
                    best[idx] = Some((amount, *date));
                }
            }
        }

        MEDICATIONS
            .iter()
            .zip(best)
            .filter_map(|(med, peak)| {
                peak.map(|(amount, date)| PeakRecord {
                    medication_id: med.id,
                    peak_amount: round_to(amount, 2),
                    peak_date: date,
                })
            })
            .collect()
    }

    /// Compare the most recent 7 logs with the 7 before them
    pub fn trend(logs: &[DailyLog]) -> Vec<TrendRecord> {
        let sorted = newest_first(logs);
        let current = &sorted[..sorted.len().min(PERIOD_LEN)];
        let previous = &sorted[current.len()..sorted.len().min(PERIOD_LEN * 2)];

        MEDICATIONS
            .iter()
            .filter_map(|med| {
                let current_avg = trend_average(current, med.id);
                let previous_avg = trend_average(previous, med.id);
                if current_avg == 0.0 && previous_avg == 0.0 {
                    return None;
                }
                Some(TrendRecord {
                    medication_id: med.id,
                    current_avg: round_to(current_avg, 2),
                    previous_avg: round_to(previous_avg, 2),
                    direction: TrendDirection::classify(current_avg, previous_avg),
                })
            })
            .collect()
    }

    /// Consecutive most recent logs without alcohol
    pub fn alcohol_free_streak(logs: &[DailyLog]) -> usize {
        newest_first(logs)
            .iter()
            .take_while(|l| !l.alcohol_consumed)
            .count()
    }

    pub fn logged_today(logs: &[DailyLog], today: NaiveDate) -> bool {
        logs.iter().any(|l| l.date == today)
    }

    /// Non-zero per-medication averages over the most recent 7 logs, highest first
    pub fn recent_averages(logs: &[DailyLog]) -> Vec<MedicationAverage> {
        let sorted = newest_first(logs);
        let recent = &sorted[..sorted.len().min(PERIOD_LEN)];

        let mut averages: Vec<(&'static str, f64)> = MEDICATIONS
            .iter()
            .map(|med| (med.id, period_average(recent, med.id)))
            .filter(|(_, avg)| *avg > 0.0)
            .collect();
        // Stable: ties stay in catalog order
        averages.sort_by(|a, b| b.1.total_cmp(&a.1));

        averages
            .into_iter()
            .map(|(medication_id, avg)| MedicationAverage {
                medication_id,
                average: round_to(avg, 1),
            })
            .collect()
    }

    /// Medication with the highest 7-log average
    pub fn top_medication(logs: &[DailyLog]) -> Option<MedicationAverage> {
        Self::recent_averages(logs).into_iter().next()
    }

    pub fn dashboard(logs: &[DailyLog], today: NaiveDate) -> DashboardSummary {
        let recent_averages = Self::recent_averages(logs);
        DashboardSummary {
            logged_today: Self::logged_today(logs, today),
            alcohol_free_streak: Self::alcohol_free_streak(logs),
            top_medication: recent_averages.first().cloned(),
            recent_averages,
            trends: Self::trend(logs),
        }
    }
}

fn newest_first(logs: &[DailyLog]) -> Vec<DailyLog> {
    let mut sorted = logs.to_vec();
    sort_newest_first(&mut sorted);
    sorted
}

/// Sum of one medication over a period divided by the period length
fn period_average(period: &[DailyLog], medication_id: &str) -> f64 {
    if period.is_empty() {
        return 0.0;
    }
    let total: f64 = period.iter().map(|l| l.dose_of(medication_id)).sum();
    total / period.len() as f64
}

/// Per-log first entry of one medication averaged over the period
fn trend_average(period: &[DailyLog], medication_id: &str) -> f64 {
    if period.is_empty() {
        return 0.0;
    }
    let total: f64 = period.iter().map(|l| l.first_dose_of(medication_id)).sum();
    total / period.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TakenMedication;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_log(d: NaiveDate, alcohol: Option<f64>, mood: Option<u8>, meds: &[(&str, f64)]) -> DailyLog {
        let mut log = DailyLog::new(d);
        if let Some(units) = alcohol {
            log.alcohol_consumed = true;
            log.alcohol_units = units;
        }
        log.mood = mood;
        log.medications = meds
            .iter()
            .map(|(id, amount)| TakenMedication::new(*id, *amount))
            .collect();
        log
    }

    // ========== bucket_key() tests ==========

    #[test]
    fn test_iso_week_year_boundary() {
        // 2021-01-01 is a Friday; the first Thursday of 2021 is Jan 7
        assert_eq!(Granularity::Weekly.bucket_key(date(2021, 1, 1)), "2020-W53");
    }

    #[test]
    fn test_iso_week_not_zero_padded() {
        assert_eq!(Granularity::Weekly.bucket_key(date(2024, 1, 3)), "2024-W1");
        // Monday starts the week
        assert_eq!(Granularity::Weekly.bucket_key(date(2024, 1, 7)), "2024-W1");
        assert_eq!(Granularity::Weekly.bucket_key(date(2024, 1, 8)), "2024-W2");
    }

    #[test]
    fn test_month_and_year_keys() {
        assert_eq!(Granularity::Monthly.bucket_key(date(2024, 3, 9)), "2024-03");
        assert_eq!(Granularity::Yearly.bucket_key(date(2024, 3, 9)), "2024");
        assert_eq!(Granularity::Daily.bucket_key(date(2024, 3, 9)), "2024-03-09");
    }

    // ========== round_to() tests ==========

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(-2.25, 1), -2.3);
        assert_eq!(round_to(1.0 / 3.0, 2), 0.33);
        assert_eq!(round_to(0.125, 2), 0.13);
    }

    // ========== aggregate() tests ==========

    #[test]
    fn test_aggregate_empty() {
        assert!(Aggregator::aggregate(&[], Granularity::Daily).is_empty());
    }

    #[test]
    fn test_daily_one_bucket_per_distinct_date() {
        let logs = vec![
            make_log(date(2024, 1, 3), None, None, &[]),
            make_log(date(2024, 1, 1), None, None, &[]),
            make_log(date(2024, 1, 3), None, None, &[]),
            make_log(date(2024, 1, 2), None, None, &[]),
        ];

        let rows = Aggregator::aggregate(&logs, Granularity::Daily);

        assert_eq!(rows.len(), 3);
        let total: usize = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, logs.len());
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_daily_label_strips_year() {
        let logs = vec![make_log(date(2024, 3, 9), None, None, &[])];
        let rows = Aggregator::aggregate(&logs, Granularity::Daily);
        assert_eq!(rows[0].label, "03-09");
        assert_eq!(rows[0].key, "2024-03-09");
    }

    #[test]
    fn test_daily_duplicates_accumulate_raw_sums() {
        let logs = vec![
            make_log(date(2024, 1, 1), Some(2.0), Some(8), &[("diazepam", 5.0)]),
            make_log(date(2024, 1, 1), Some(3.0), None, &[("diazepam", 2.5)]),
        ];

        let rows = Aggregator::aggregate(&logs, Granularity::Daily);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        // Daily uses the raw sum
        assert_eq!(rows[0].alcohol_units, 5.0);
        assert_eq!(rows[0].amount("diazepam"), 7.5);
        // Mood is always averaged: (8 + 5) / 2
        assert_eq!(rows[0].mood, 6.5);
    }

    #[test]
    fn test_alcohol_not_consumed_counts_as_zero() {
        let mut log = make_log(date(2024, 1, 1), None, None, &[]);
        log.alcohol_units = 6.0;
        let rows = Aggregator::aggregate(&[log], Granularity::Daily);
        assert_eq!(rows[0].alcohol_units, 0.0);
    }

    #[test]
    fn test_weekly_averages_over_count() {
        let logs = vec![
            make_log(date(2024, 1, 1), Some(3.0), Some(4), &[("diazepam", 10.0)]),
            make_log(date(2024, 1, 2), None, Some(7), &[("diazepam", 5.0)]),
            make_log(date(2024, 1, 3), None, None, &[]),
        ];

        let rows = Aggregator::aggregate(&logs, Granularity::Weekly);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "2024-W1");
        assert_eq!(rows[0].alcohol_units, 1.0);
        assert_eq!(rows[0].mood, 5.3); // 16 / 3
        assert_eq!(rows[0].amount("diazepam"), 5.0);
    }

    #[test]
    fn test_monthly_buckets_chronological() {
        let logs = vec![
            make_log(date(2024, 3, 5), None, None, &[]),
            make_log(date(2023, 12, 31), None, None, &[]),
            make_log(date(2024, 1, 15), None, None, &[]),
        ];

        let rows = Aggregator::aggregate(&logs, Granularity::Monthly);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-03"]);
    }

    #[test]
    fn test_yearly_buckets() {
        let logs = vec![
            make_log(date(2023, 6, 1), None, None, &[("lorazepam", 1.0)]),
            make_log(date(2024, 6, 1), None, None, &[("lorazepam", 2.0)]),
            make_log(date(2024, 7, 1), None, None, &[]),
        ];

        let rows = Aggregator::aggregate(&logs, Granularity::Yearly);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].key, "2024");
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].amount("lorazepam"), 1.0);
    }

    #[test]
    fn test_every_catalog_medication_present_in_order() {
        let logs = vec![make_log(date(2024, 1, 1), None, None, &[("temazepam", 10.0)])];
        let rows = Aggregator::aggregate(&logs, Granularity::Daily);

        let ids: Vec<&str> = rows[0].medications.iter().map(|m| m.medication_id).collect();
        let catalog: Vec<&str> = MEDICATIONS.iter().map(|m| m.id).collect();
        assert_eq!(ids, catalog);
        assert_eq!(rows[0].amount("temazepam"), 10.0);
        assert_eq!(rows[0].amount("alprazolam"), 0.0);
    }

    #[test]
    fn test_unknown_medication_ids_ignored() {
        let logs = vec![make_log(date(2024, 1, 1), None, None, &[("aspirin", 500.0)])];
        let rows = Aggregator::aggregate(&logs, Granularity::Daily);
        assert!(rows[0].medications.iter().all(|m| m.amount == 0.0));
    }

    #[test]
    fn test_reasons_only_for_daily() {
        let mut log = make_log(date(2024, 1, 1), None, None, &[("alprazolam", 0.5), ("alprazolam", 0.25)]);
        log.medications[0].reason = Some("panic".into());
        log.medications[1].reason = Some("  ".into());
        let mut other = make_log(date(2024, 1, 1), None, None, &[("alprazolam", 0.5)]);
        other.medications[0].reason = Some("insomnia".into());
        let logs = vec![log, other];

        let daily = Aggregator::aggregate(&logs, Granularity::Daily);
        let alp = &daily[0].medications[0];
        assert_eq!(alp.reasons.as_deref(), Some("panic; insomnia"));
        assert!(daily[0].medications[1].reasons.is_none());

        let monthly = Aggregator::aggregate(&logs, Granularity::Monthly);
        assert!(monthly[0].medications.iter().all(|m| m.reasons.is_none()));
    }

    #[test]
    fn test_rounding_happens_at_output() {
        let logs = vec![
            make_log(date(2024, 1, 1), None, None, &[("clonazepam", 0.125)]),
            make_log(date(2024, 1, 2), None, None, &[("clonazepam", 0.125)]),
            make_log(date(2024, 1, 3), None, None, &[("clonazepam", 0.125)]),
        ];
        let rows = Aggregator::aggregate(&logs, Granularity::Monthly);
        // 0.375 / 3 = 0.125 → 0.13 (not 0.13*3/3 from pre-rounded inputs)
        assert_eq!(rows[0].amount("clonazepam"), 0.13);
    }

    #[test]
    fn test_aggregate_does_not_mutate_input() {
        let logs = vec![
            make_log(date(2024, 1, 3), None, None, &[]),
            make_log(date(2024, 1, 1), None, None, &[]),
        ];
        let before = logs.clone();
        let _ = Aggregator::aggregate(&logs, Granularity::Weekly);
        assert_eq!(logs, before);
    }

    // ========== peaks() tests ==========

    #[test]
    fn test_peaks_tie_resolves_to_earliest_date() {
        let logs = vec![
            make_log(date(2024, 1, 2), None, None, &[("diazepam", 5.0), ("diazepam", 5.0)]),
            make_log(date(2024, 1, 1), None, None, &[("diazepam", 10.0)]),
        ];

        let peaks = Aggregator::peaks(&logs);

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].medication_id, "diazepam");
        assert_eq!(peaks[0].peak_amount, 10.0);
        assert_eq!(peaks[0].peak_date, date(2024, 1, 1));
    }

    #[test]
    fn test_peaks_same_day_entries_summed() {
        let logs = vec![
            make_log(date(2024, 1, 1), None, None, &[("diazepam", 10.0)]),
            make_log(date(2024, 1, 2), None, None, &[("diazepam", 6.0), ("diazepam", 5.0)]),
        ];

        let peaks = Aggregator::peaks(&logs);
        assert_eq!(peaks[0].peak_amount, 11.0);
        assert_eq!(peaks[0].peak_date, date(2024, 1, 2));
    }

    #[test]
    fn test_peaks_sum_across_duplicate_logs_for_date() {
        let logs = vec![
            make_log(date(2024, 1, 1), None, None, &[("lorazepam", 1.0)]),
            make_log(date(2024, 1, 1), None, None, &[("lorazepam", 1.5)]),
            make_log(date(2024, 1, 2), None, None, &[("lorazepam", 2.0)]),
        ];
        let peaks = Aggregator::peaks(&logs);
        assert_eq!(peaks[0].peak_amount, 2.5);
        assert_eq!(peaks[0].peak_date, date(2024, 1, 1));
    }

    #[test]
    fn test_peaks_only_positive_in_catalog_order() {
        let logs = vec![make_log(
            date(2024, 1, 1),
            None,
            None,
            &[("temazepam", 15.0), ("alprazolam", 0.5)],
        )];
        let peaks = Aggregator::peaks(&logs);
        let ids: Vec<&str> = peaks.iter().map(|p| p.medication_id).collect();
        assert_eq!(ids, vec!["alprazolam", "temazepam"]);
    }

    #[test]
    fn test_peaks_empty() {
        assert!(Aggregator::peaks(&[]).is_empty());
    }

    // ========== trend() tests ==========

    #[test]
    fn test_trend_epsilon_boundary() {
        assert_eq!(TrendDirection::classify(5.05, 5.00), TrendDirection::Flat);
        assert_eq!(TrendDirection::classify(5.06, 5.00), TrendDirection::Up);
        assert_eq!(TrendDirection::classify(4.94, 5.00), TrendDirection::Down);
        assert_eq!(TrendDirection::classify(4.95, 5.00), TrendDirection::Flat);
    }

    #[test]
    fn test_trend_periods_split_at_seven() {
        // 14 days: newer 7 take 2mg, older 7 take 4mg
        let mut logs = Vec::new();
        for day in 1..=14u32 {
            let amount = if day > 7 { 2.0 } else { 4.0 };
            logs.push(make_log(date(2024, 1, day), None, None, &[("diazepam", amount)]));
        }

        let trends = Aggregator::trend(&logs);

        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].current_avg, 2.0);
        assert_eq!(trends[0].previous_avg, 4.0);
        assert_eq!(trends[0].direction, TrendDirection::Down);
    }

    #[test]
    fn test_trend_missing_entries_count_as_zero() {
        let logs = vec![
            make_log(date(2024, 1, 2), None, None, &[("lorazepam", 1.4)]),
            make_log(date(2024, 1, 1), None, None, &[]),
        ];
        let trends = Aggregator::trend(&logs);
        // Both logs in current period: 1.4 / 2
        assert_eq!(trends[0].current_avg, 0.7);
        assert_eq!(trends[0].previous_avg, 0.0);
        assert_eq!(trends[0].direction, TrendDirection::Up);
    }

    #[test]
    fn test_trend_uses_first_entry_per_log() {
        let logs = vec![make_log(
            date(2024, 1, 1),
            None,
            None,
            &[("diazepam", 5.0), ("diazepam", 5.0)],
        )];
        let trends = Aggregator::trend(&logs);
        assert_eq!(trends[0].current_avg, 5.0);
        assert_eq!(trends[0].previous_avg, 0.0);
        assert_eq!(trends[0].direction, TrendDirection::Up);

        // The 7-log averages still count every entry
        assert_eq!(Aggregator::recent_averages(&logs)[0].average, 10.0);
    }

    #[test]
    fn test_trend_omits_unused_medications() {
        let logs = vec![make_log(date(2024, 1, 1), None, None, &[])];
        assert!(Aggregator::trend(&logs).is_empty());
    }

    // ========== derived values ==========

    #[test]
    fn test_alcohol_free_streak_stops_at_first_drink() {
        // Newest first: false, false, true, false
        let logs = vec![
            make_log(date(2024, 1, 4), None, None, &[]),
            make_log(date(2024, 1, 3), None, None, &[]),
            make_log(date(2024, 1, 2), Some(2.0), None, &[]),
            make_log(date(2024, 1, 1), None, None, &[]),
        ];
        assert_eq!(Aggregator::alcohol_free_streak(&logs), 2);
    }

    #[test]
    fn test_alcohol_free_streak_sorts_unordered_input() {
        let logs = vec![
            make_log(date(2024, 1, 2), Some(2.0), None, &[]),
            make_log(date(2024, 1, 4), None, None, &[]),
            make_log(date(2024, 1, 3), None, None, &[]),
        ];
        assert_eq!(Aggregator::alcohol_free_streak(&logs), 2);
        assert_eq!(Aggregator::alcohol_free_streak(&[]), 0);
    }

    #[test]
    fn test_logged_today() {
        let logs = vec![make_log(date(2024, 1, 4), None, None, &[])];
        assert!(Aggregator::logged_today(&logs, date(2024, 1, 4)));
        assert!(!Aggregator::logged_today(&logs, date(2024, 1, 5)));
    }

    #[test]
    fn test_top_medication_uses_recent_seven() {
        let mut logs = vec![make_log(date(2024, 1, 1), None, None, &[("alprazolam", 100.0)])];
        for day in 2..=8u32 {
            logs.push(make_log(date(2024, 1, day), None, None, &[("diazepam", 7.0)]));
        }
        logs[7].medications.push(TakenMedication::new("oxazepam", 14.0));

        let top = Aggregator::top_medication(&logs).unwrap();
        assert_eq!(top.medication_id, "diazepam");
        assert_eq!(top.average, 7.0);

        let averages = Aggregator::recent_averages(&logs);
        let ids: Vec<&str> = averages.iter().map(|a| a.medication_id).collect();
        assert_eq!(ids, vec!["diazepam", "oxazepam"]);
        assert_eq!(averages[1].average, 2.0);
    }

    #[test]
    fn test_top_medication_none_without_doses() {
        let logs = vec![make_log(date(2024, 1, 1), None, None, &[])];
        assert!(Aggregator::top_medication(&logs).is_none());
    }

    #[test]
    fn test_dashboard_bundle() {
        let logs = vec![
            make_log(date(2024, 1, 2), None, None, &[("diazepam", 5.0)]),
            make_log(date(2024, 1, 1), Some(1.0), None, &[]),
        ];
        let summary = Aggregator::dashboard(&logs, date(2024, 1, 2));
        assert!(summary.logged_today);
        assert_eq!(summary.alcohol_free_streak, 1);
        assert_eq!(summary.top_medication.unwrap().medication_id, "diazepam");
        assert_eq!(summary.trends.len(), 1);
    }
}
