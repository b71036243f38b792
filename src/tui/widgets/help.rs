//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 17;

const NAVIGATION: [(&str, &str); 4] = [
    ("Tab / Shift+Tab", "Switch view"),
    ("1-3", "Jump to view"),
    ("Up/Down or j/k", "Scroll (Statistics)"),
    ("d / w / m / y", "Day/Week/Month/Year"),
];

const GENERAL: [(&str, &str); 3] = [
    ("i", "Generate insight"),
    ("q / Esc", "Quit"),
    ("?", "Toggle help"),
];

pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }

    fn render_section(
        &self,
        title: &str,
        entries: &[(&str, &str)],
        area: Rect,
        buf: &mut Buffer,
    ) {
        let rows = Layout::vertical(
            std::iter::repeat(Constraint::Length(1)).take(entries.len() + 2),
        )
        .split(area);

        Paragraph::new(Span::styled(
            title,
            Style::default()
                .fg(self.theme.primary())
                .add_modifier(Modifier::BOLD),
        ))
        .render(rows[0], buf);
        buf.set_string(
            rows[1].x,
            rows[1].y,
            "─".repeat(rows[1].width as usize),
            Style::default().fg(self.theme.border()),
        );
        for (row, (key, desc)) in rows[2..].iter().zip(entries) {
            let line = Line::from(vec![
                Span::styled(
                    format!("  {:<18}", key),
                    Style::default().fg(self.theme.primary()),
                ),
                Span::styled(*desc, Style::default().fg(self.theme.text())),
            ]);
            Paragraph::new(line).render(*row, buf);
        }
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(format!(" soberstats v{} ", VERSION))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.primary()));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(NAVIGATION.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Length(GENERAL.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        self.render_section("Navigation", &NAVIGATION, chunks[1], buf);
        self.render_section("General", &GENERAL, chunks[3], buf);

        Paragraph::new(Span::styled(
            "Press ? to close",
            Style::default().fg(self.theme.secondary()),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    }
}
