//! Dashboard view: today, streak, top medication, trends and insight

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use super::tabs::{Tab, TabBar};
use super::{centered_content, render_keybindings, render_separator};
use crate::services::aggregator::{DashboardSummary, TrendDirection};
use crate::services::Insight;
use crate::tui::theme::{hex_color, Theme};
use crate::types::find_medication;

const CARD_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 5;

/// Width of the average bars
const BAR_WIDTH: usize = 24;

/// State of the narrative panel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InsightPanel {
    #[default]
    Idle,
    Pending,
    Ready(Insight),
}

pub struct DashboardData<'a> {
    pub name: &'a str,
    pub backend: &'a str,
    pub summary: &'a DashboardSummary,
    pub insight: &'a InsightPanel,
    pub warning: Option<&'a str>,
}

pub struct DashboardView<'a> {
    data: DashboardData<'a>,
    theme: Theme,
}

impl<'a> DashboardView<'a> {
    pub fn new(data: DashboardData<'a>, theme: Theme) -> Self {
        Self { data, theme }
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered_content(area);
        let avg_rows = self.data.summary.recent_averages.len().max(1) as u16;
        let trend_rows = self.data.summary.trends.len().max(1) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(1),              // 0: Tabs
            Constraint::Length(1),              // 1: Separator
            Constraint::Length(1),              // 2: Greeting
            Constraint::Length(1),              // 3: Blank
            Constraint::Length(CARD_HEIGHT),    // 4: Cards
            Constraint::Length(1),              // 5: Blank
            Constraint::Length(1 + avg_rows),   // 6: Averages
            Constraint::Length(1),              // 7: Blank
            Constraint::Length(1 + trend_rows), // 8: Trends
            Constraint::Length(1),              // 9: Blank
            Constraint::Fill(1),                // 10: Insight
            Constraint::Length(1),              // 11: Warning
            Constraint::Length(1),              // 12: Separator
            Constraint::Length(1),              // 13: Keybindings
        ])
        .split(area);

        TabBar::new(Tab::Dashboard, self.theme).render(chunks[0], buf);
        render_separator(chunks[1], buf, self.theme);
        self.render_greeting(chunks[2], buf);
        self.render_cards(chunks[4], buf);
        self.render_averages(chunks[6], buf);
        self.render_trends(chunks[8], buf);
        self.render_insight(chunks[10], buf);
        self.render_warning(chunks[11], buf);
        render_separator(chunks[12], buf, self.theme);
        render_keybindings(
            chunks[13],
            buf,
            self.theme,
            &[("Tab", "Switch view"), ("i", "Insight"), ("?", "Help"), ("q", "Quit")],
        );
    }
}

impl DashboardView<'_> {
    fn render_greeting(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(Line::from(vec![
            Span::styled(
                "SOBERSTATS",
                Style::default()
                    .fg(self.theme.primary())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" // ", Style::default().fg(self.theme.border())),
            Span::styled(self.data.name, Style::default().fg(self.theme.text())),
            Span::styled(
                format!("  [{}]", self.data.backend),
                Style::default().fg(self.theme.secondary()),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(area, buf);
    }

    fn render_cards(&self, area: Rect, buf: &mut Buffer) {
        let summary = self.data.summary;
        let (today_value, today_color) = if summary.logged_today {
            ("LOGGED".to_string(), self.theme.success())
        } else {
            ("PENDING".to_string(), self.theme.warning())
        };
        let streak_color = if summary.alcohol_free_streak > 0 {
            self.theme.success()
        } else {
            self.theme.warning()
        };
        let top = summary
            .top_medication
            .as_ref()
            .map(|m| {
                let name = find_medication(m.medication_id)
                    .map(|r| r.short_name())
                    .unwrap_or(m.medication_id);
                format!("{} {}mg", name, m.average)
            })
            .unwrap_or_else(|| "None".to_string());

        let cards = [
            ("Today", today_value, today_color),
            (
                "Alcohol-free streak",
                format!("{} days", summary.alcohol_free_streak),
                streak_color,
            ),
            ("Top medication (7 logs)", top, self.theme.primary()),
        ];

        let total_width = CARD_WIDTH * cards.len() as u16 + 2 * (cards.len() as u16 - 1);
        let mut x = area.x + area.width.saturating_sub(total_width) / 2;
        for (title, value, color) in cards {
            if x + CARD_WIDTH > area.x + area.width {
                break;
            }
            let card = Rect {
                x,
                y: area.y,
                width: CARD_WIDTH,
                height: area.height.min(CARD_HEIGHT),
            };
            let block = Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.border()));
            let inner = block.inner(card);
            block.render(card, buf);
            Paragraph::new(Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .render(
                Rect {
                    y: inner.y + inner.height / 2,
                    height: 1,
                    ..inner
                },
                buf,
            );
            x += CARD_WIDTH + 2;
        }
    }

    fn render_averages(&self, area: Rect, buf: &mut Buffer) {
        buf.set_string(
            area.x + 2,
            area.y,
            "7-log average per medication",
            Style::default()
                .fg(self.theme.text())
                .add_modifier(Modifier::BOLD),
        );

        let averages = &self.data.summary.recent_averages;
        if averages.is_empty() {
            buf.set_string(
                area.x + 4,
                area.y + 1,
                "No medication in the last 7 logs",
                Style::default().fg(self.theme.secondary()),
            );
            return;
        }

        let max = averages.iter().map(|a| a.average).fold(0.0_f64, f64::max);
        for (i, avg) in averages.iter().enumerate() {
            let y = area.y + 1 + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let (name, color) = find_medication(avg.medication_id)
                .map(|r| (r.short_name(), hex_color(r.color)))
                .unwrap_or((avg.medication_id, self.theme.primary()));
            let filled = if max > 0.0 {
                ((avg.average / max) * BAR_WIDTH as f64).round().max(1.0) as usize
            } else {
                0
            }
            .min(BAR_WIDTH);

            let line = Line::from(vec![
                Span::styled(format!("{:>18}  ", name), Style::default().fg(self.theme.text())),
                Span::styled("█".repeat(filled), Style::default().fg(color)),
                Span::styled(
                    "░".repeat(BAR_WIDTH - filled),
                    Style::default().fg(self.theme.grid()),
                ),
                Span::styled(
                    format!("  {}mg", avg.average),
                    Style::default().fg(self.theme.text()),
                ),
            ]);
            buf.set_line(area.x + 2, y, &line, area.width.saturating_sub(2));
        }
    }

    fn render_trends(&self, area: Rect, buf: &mut Buffer) {
        buf.set_string(
            area.x + 2,
            area.y,
            "Trend: last 7 logs vs previous 7",
            Style::default()
                .fg(self.theme.text())
                .add_modifier(Modifier::BOLD),
        );

        let trends = &self.data.summary.trends;
        if trends.is_empty() {
            buf.set_string(
                area.x + 4,
                area.y + 1,
                "Not enough data yet",
                Style::default().fg(self.theme.secondary()),
            );
            return;
        }

        for (i, trend) in trends.iter().enumerate() {
            let y = area.y + 1 + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let name = find_medication(trend.medication_id)
                .map(|r| r.short_name())
                .unwrap_or(trend.medication_id);
            // Falling doses are the good direction
            let color = match trend.direction {
                TrendDirection::Down => self.theme.success(),
                TrendDirection::Up => self.theme.warning(),
                TrendDirection::Flat => self.theme.secondary(),
            };
            let line = Line::from(vec![
                Span::styled(format!("{:>18}  ", name), Style::default().fg(self.theme.text())),
                Span::styled(trend.direction.symbol(), Style::default().fg(color)),
                Span::styled(
                    format!("  {}mg (was {}mg)", trend.current_avg, trend.previous_avg),
                    Style::default().fg(self.theme.text()),
                ),
            ]);
            buf.set_line(area.x + 2, y, &line, area.width.saturating_sub(2));
        }
    }

    fn render_insight(&self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 {
            return;
        }
        let block = Block::default()
            .title(" Insight ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = match self.data.insight {
            InsightPanel::Idle => (
                "Press i to analyse the last 7 logs.",
                Style::default().fg(self.theme.secondary()),
            ),
            InsightPanel::Pending => (
                "Analysing...",
                Style::default().fg(self.theme.secondary()),
            ),
            InsightPanel::Ready(insight) => {
                (insight.text.as_str(), Style::default().fg(self.theme.text()))
            }
        };
        Paragraph::new(Span::styled(text, style))
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }

    fn render_warning(&self, area: Rect, buf: &mut Buffer) {
        if let Some(warning) = self.data.warning {
            Paragraph::new(Span::styled(
                format!("! {}", warning),
                Style::default().fg(self.theme.warning()),
            ))
            .alignment(Alignment::Center)
            .render(area, buf);
        }
    }
}
