//! Plain-text rendering of reports for the CLI

use crate::services::aggregator::{BucketRow, DashboardSummary, Granularity, PeakRecord, TrendRecord};
use crate::types::{find_medication, DailyLog, MedicationReference, MEDICATIONS};

/// Column width for per-medication values
const MED_COL: usize = 11;

fn short_name(id: &str) -> &str {
    find_medication(id).map(|m| m.short_name()).unwrap_or(id)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Format a number without trailing zeros ("5", "2.5")
pub fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn render_logs(logs: &[DailyLog]) -> String {
    if logs.is_empty() {
        return "No logs recorded yet.".to_string();
    }
    let mut lines = vec![format!(
        "{:<10}  {:<8}  {:>7}  {:>4}  {}",
        "Date", "Id", "Alcohol", "Mood", "Medications"
    )];
    for log in logs {
        let meds = log
            .medications
            .iter()
            .map(|m| {
                let name = m.custom_name.as_deref().unwrap_or_else(|| short_name(&m.medication_id));
                match &m.time_taken {
                    Some(t) => format!("{} {}mg@{}", name, num(m.amount), t),
                    None => format!("{} {}mg", name, num(m.amount)),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{:<10}  {:<8}  {:>7}  {:>4}  {}",
            log.date,
            truncate(&log.id, 8),
            if log.alcohol_consumed {
                num(log.alcohol_units)
            } else {
                "-".to_string()
            },
            log.mood.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
            meds
        ));
    }
    lines.join("\n")
}

pub fn render_buckets(rows: &[BucketRow], granularity: Granularity) -> String {
    if rows.is_empty() {
        return "No logs recorded yet.".to_string();
    }
    let mut header = format!(
        "{:<10} {:>5} {:>7} {:>5}",
        granularity.label(),
        "Logs",
        "Alcohol",
        "Mood"
    );
    for med in MEDICATIONS {
        header.push_str(&format!(" {:>w$}", truncate(med.short_name(), MED_COL), w = MED_COL));
    }

    let mut lines = vec![header];
    for row in rows {
        let mut line = format!(
            "{:<10} {:>5} {:>7} {:>5}",
            row.key,
            row.count,
            num(row.alcohol_units),
            num(row.mood)
        );
        for med in &row.medications {
            let cell = if med.amount > 0.0 { num(med.amount) } else { "-".into() };
            line.push_str(&format!(" {:>w$}", cell, w = MED_COL));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn render_peaks(peaks: &[PeakRecord]) -> String {
    if peaks.is_empty() {
        return "No doses recorded yet.".to_string();
    }
    peaks
        .iter()
        .map(|p| {
            format!(
                "{:<14} {:>8}mg  on {}",
                short_name(p.medication_id),
                num(p.peak_amount),
                p.peak_date
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_trends(trends: &[TrendRecord]) -> String {
    if trends.is_empty() {
        return "Not enough data for trends yet.".to_string();
    }
    trends
        .iter()
        .map(|t| {
            format!(
                "{:<14} {} {:>8} (prev {})",
                short_name(t.medication_id),
                t.direction.symbol(),
                num(t.current_avg),
                num(t.previous_avg)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(name: &str, summary: &DashboardSummary) -> String {
    let mut lines = vec![
        format!("Hello, {}.", name),
        format!(
            "Today:              {}",
            if summary.logged_today { "logged" } else { "not logged yet" }
        ),
        format!("Alcohol-free days:  {}", summary.alcohol_free_streak),
    ];
    match &summary.top_medication {
        Some(top) => lines.push(format!(
            "Most used (7 logs): {} {}mg avg",
            short_name(top.medication_id),
            num(top.average)
        )),
        None => lines.push("Most used (7 logs): none".to_string()),
    }
    if !summary.trends.is_empty() {
        lines.push(String::new());
        lines.push("Trends (last 7 vs previous 7 logs):".to_string());
        lines.push(render_trends(&summary.trends));
    }
    lines.join("\n")
}

pub fn render_reference(catalog: &[MedicationReference]) -> String {
    let mut lines = vec![format!(
        "{:<12} {:<24} {:>10} {:>12}",
        "Id", "Name", "Half-life", "Diazepam eq"
    )];
    for med in catalog {
        lines.push(format!(
            "{:<12} {:<24} {:>9}h {:>12}",
            med.id,
            med.name,
            med.half_life_hours,
            if med.diazepam_equivalence > 0.0 {
                format!("1mg = {}mg", num(med.diazepam_equivalence))
            } else {
                "n/a".to_string()
            }
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Aggregator;
    use crate::types::TakenMedication;
    use chrono::NaiveDate;

    fn make_log(day: u32, meds: &[(&str, f64)]) -> DailyLog {
        let mut log = DailyLog::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap());
        log.medications = meds
            .iter()
            .map(|(id, amount)| TakenMedication::new(*id, *amount))
            .collect();
        log
    }

    #[test]
    fn test_num_trims_zeros() {
        assert_eq!(num(5.0), "5");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(0.126), "0.13");
        assert_eq!(num(0.0), "0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 8), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_render_logs_empty_and_rows() {
        assert_eq!(render_logs(&[]), "No logs recorded yet.");
        let text = render_logs(&[make_log(2, &[("diazepam", 5.0)])]);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Diazepam 5mg"));
    }

    #[test]
    fn test_render_buckets_has_one_line_per_row() {
        let logs = vec![make_log(1, &[("diazepam", 5.0)]), make_log(2, &[])];
        let rows = Aggregator::aggregate(&logs, Granularity::Daily);
        let text = render_buckets(&rows, Granularity::Daily);
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("Day"));
    }

    #[test]
    fn test_render_peaks() {
        let logs = vec![make_log(1, &[("lorazepam", 2.0)])];
        let text = render_peaks(&Aggregator::peaks(&logs));
        assert!(text.contains("Lorazepam"));
        assert!(text.contains("2024-01-01"));
    }

    #[test]
    fn test_render_reference_lists_catalog() {
        let text = render_reference(MEDICATIONS);
        assert_eq!(text.lines().count(), MEDICATIONS.len() + 1);
        assert!(text.contains("n/a"));
    }
}
