//! Statistics view: bucketed history table and peak doses

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::tabs::{Tab, TabBar};
use super::{centered_content, render_keybindings, render_separator};
use crate::services::aggregator::{BucketRow, Granularity, PeakRecord};
use crate::services::Aggregator;
use crate::tui::theme::{hex_color, Theme};
use crate::types::{DailyLog, MedicationReference, MEDICATIONS};

/// Visible table rows (excluding header)
pub const VISIBLE_ROWS: usize = 12;

const PERIOD_WIDTH: usize = 12;
const NUM_WIDTH: usize = 9;
const MED_WIDTH: usize = 12;

/// Bucket rows for every granularity, computed once per data refresh
#[derive(Debug, Default)]
pub struct StatisticsData {
    /// Newest bucket first, indexed like [`Granularity::ALL`]
    buckets: [Vec<BucketRow>; 4],
    pub peaks: Vec<PeakRecord>,
    /// Catalog medications with any recorded dose
    medications: Vec<&'static MedicationReference>,
}

impl StatisticsData {
    pub fn from_logs(logs: &[DailyLog]) -> Self {
        let buckets = Granularity::ALL.map(|g| {
            let mut rows = Aggregator::aggregate(logs, g);
            rows.reverse();
            rows
        });

        let medications = MEDICATIONS
            .iter()
            .filter(|m| {
                buckets[0]
                    .iter()
                    .any(|row| row.amount(m.id) > 0.0)
            })
            .collect();

        Self {
            buckets,
            peaks: Aggregator::peaks(logs),
            medications,
        }
    }

    pub fn rows(&self, granularity: Granularity) -> &[BucketRow] {
        let idx = Granularity::ALL
            .iter()
            .position(|g| *g == granularity)
            .unwrap_or(0);
        &self.buckets[idx]
    }

    pub fn max_scroll_offset(&self, granularity: Granularity) -> usize {
        self.rows(granularity).len().saturating_sub(VISIBLE_ROWS)
    }
}

pub struct StatisticsView<'a> {
    data: &'a StatisticsData,
    granularity: Granularity,
    scroll_offset: usize,
    theme: Theme,
}

impl<'a> StatisticsView<'a> {
    pub fn new(
        data: &'a StatisticsData,
        granularity: Granularity,
        scroll_offset: usize,
        theme: Theme,
    ) -> Self {
        Self {
            data,
            granularity,
            scroll_offset,
            theme,
        }
    }

    /// Medication columns that fit in `width`
    fn medication_columns(&self, width: u16) -> &[&'static MedicationReference] {
        let fixed = PERIOD_WIDTH + 3 * NUM_WIDTH;
        let room = (width as usize).saturating_sub(fixed) / MED_WIDTH;
        let n = room.min(self.data.medications.len());
        &self.data.medications[..n]
    }
}

impl Widget for StatisticsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered_content(area);
        let rows = self.data.rows(self.granularity);
        let visible_rows = rows.len().clamp(1, VISIBLE_ROWS) as u16;
        let peak_rows = self.data.peaks.len().max(1) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(1),             // Tabs
            Constraint::Length(1),             // Separator
            Constraint::Length(1),             // Granularity selector
            Constraint::Length(1),             // Header
            Constraint::Length(visible_rows),  // Rows
            Constraint::Length(1),             // Blank
            Constraint::Length(1 + peak_rows), // Peaks
            Constraint::Min(0),
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Keybindings
        ])
        .split(area);

        TabBar::new(Tab::Statistics, self.theme).render(chunks[0], buf);
        render_separator(chunks[1], buf, self.theme);
        self.render_selector(chunks[2], buf);
        self.render_header(chunks[3], buf);
        self.render_rows(chunks[4], buf);
        self.render_peaks(chunks[6], buf);
        render_separator(chunks[8], buf, self.theme);
        render_keybindings(
            chunks[9],
            buf,
            self.theme,
            &[
                ("d/w/m/y", "Granularity"),
                ("↑↓", "Scroll"),
                ("Tab", "Switch view"),
                ("q", "Quit"),
            ],
        );
    }
}

impl StatisticsView<'_> {
    fn render_selector(&self, area: Rect, buf: &mut Buffer) {
        let keys = ['d', 'w', 'm', 'y'];
        let mut spans = Vec::new();
        for (i, (key, g)) in keys.iter().zip(Granularity::ALL).enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            let style = if g == self.granularity {
                Style::default()
                    .fg(self.theme.primary())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.secondary())
            };
            spans.push(Span::styled(format!("{}:{}", key, g.label()), style));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);
        let mut spans = vec![
            Span::styled(
                format!("{:<width$}", self.granularity.label(), width = PERIOD_WIDTH),
                style,
            ),
            Span::styled(format!("{:>width$}", "Logs", width = NUM_WIDTH), style),
            Span::styled(format!("{:>width$}", "Alcohol", width = NUM_WIDTH), style),
            Span::styled(format!("{:>width$}", "Mood", width = NUM_WIDTH), style),
        ];
        for med in self.medication_columns(area.width) {
            let name: String = med.short_name().chars().take(MED_WIDTH - 1).collect();
            spans.push(Span::styled(
                format!("{:>width$}", name, width = MED_WIDTH),
                Style::default()
                    .fg(hex_color(med.color))
                    .add_modifier(Modifier::BOLD),
            ));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }

    fn render_rows(&self, area: Rect, buf: &mut Buffer) {
        let rows = self.data.rows(self.granularity);
        if rows.is_empty() {
            buf.set_string(
                area.x,
                area.y,
                "No logs yet",
                Style::default().fg(self.theme.secondary()),
            );
            return;
        }

        let columns = self.medication_columns(area.width);
        let start = self.scroll_offset.min(rows.len());
        let end = (start + area.height as usize).min(rows.len());

        for (i, row) in rows[start..end].iter().enumerate() {
            let y = area.y + i as u16;
            let text = Style::default().fg(self.theme.text());
            let alcohol_style = if row.alcohol_units > 0.0 {
                Style::default().fg(self.theme.warning())
            } else {
                text
            };

            let mut spans = vec![
                Span::styled(format!("{:<width$}", row.label, width = PERIOD_WIDTH), text),
                Span::styled(format!("{:>width$}", row.count, width = NUM_WIDTH), text),
                Span::styled(
                    format!("{:>width$}", row.alcohol_units, width = NUM_WIDTH),
                    alcohol_style,
                ),
                Span::styled(format!("{:>width$}", row.mood, width = NUM_WIDTH), text),
            ];
            for med in columns {
                let amount = row.amount(med.id);
                let (value, style) = if amount > 0.0 {
                    (amount.to_string(), text)
                } else {
                    ("·".to_string(), Style::default().fg(self.theme.grid()))
                };
                spans.push(Span::styled(
                    format!("{:>width$}", value, width = MED_WIDTH),
                    style,
                ));
            }
            buf.set_line(area.x, y, &Line::from(spans), area.width);
        }
    }

    fn render_peaks(&self, area: Rect, buf: &mut Buffer) {
        buf.set_string(
            area.x,
            area.y,
            "Peak single-day dose",
            Style::default()
                .fg(self.theme.text())
                .add_modifier(Modifier::BOLD),
        );
        if self.data.peaks.is_empty() {
            buf.set_string(
                area.x + 2,
                area.y + 1,
                "No medication recorded",
                Style::default().fg(self.theme.secondary()),
            );
            return;
        }

        for (i, peak) in self.data.peaks.iter().enumerate() {
            let y = area.y + 1 + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let (name, color) = MEDICATIONS
                .iter()
                .find(|m| m.id == peak.medication_id)
                .map(|m| (m.short_name(), hex_color(m.color)))
                .unwrap_or((peak.medication_id, self.theme.primary()));
            let line = Line::from(vec![
                Span::styled(format!("  {:<18}", name), Style::default().fg(color)),
                Span::styled(
                    format!("{:>8}mg  ", peak.peak_amount),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    peak.peak_date.format("%Y-%m-%d").to_string(),
                    Style::default().fg(self.theme.secondary()),
                ),
            ]);
            buf.set_line(area.x, y, &line, area.width);
        }
    }
}
