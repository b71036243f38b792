//! Reference view: the medication catalog

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::tabs::{Tab, TabBar};
use super::{centered_content, render_keybindings, render_separator};
use crate::tui::theme::{hex_color, Theme};
use crate::types::{MedicationReference, MEDICATIONS};

const COLUMNS: [(&str, usize); 4] = [
    ("Medication", 30),
    ("Half-life (h)", 16),
    ("≈ Diazepam", 14),
    ("Unit", 6),
];

const TABLE_WIDTH: u16 = 30 + 16 + 14 + 6;

pub struct ReferenceView<'a> {
    medications: &'a [MedicationReference],
    theme: Theme,
}

impl ReferenceView<'static> {
    pub fn new(theme: Theme) -> Self {
        Self {
            medications: MEDICATIONS,
            theme,
        }
    }
}

impl Widget for ReferenceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = centered_content(area);
        let chunks = Layout::vertical([
            Constraint::Length(1),                              // Tabs
            Constraint::Length(1),                              // Separator
            Constraint::Length(1),                              // Blank
            Constraint::Length(1),                              // Header
            Constraint::Length(self.medications.len() as u16), // Rows
            Constraint::Length(1),                              // Blank
            Constraint::Length(1),                              // Note
            Constraint::Min(0),
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Keybindings
        ])
        .split(area);

        TabBar::new(Tab::Reference, self.theme).render(chunks[0], buf);
        render_separator(chunks[1], buf, self.theme);

        let x = area.x + area.width.saturating_sub(TABLE_WIDTH) / 2;
        let header_style = Style::default()
            .fg(self.theme.text())
            .add_modifier(Modifier::BOLD);
        let header: Vec<Span> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, (label, width))| {
                let text = if i == 0 {
                    format!("{:<width$}", label, width = width)
                } else {
                    format!("{:>width$}", label, width = width)
                };
                Span::styled(text, header_style)
            })
            .collect();
        buf.set_line(x, chunks[3].y, &Line::from(header), chunks[3].width);

        for (i, med) in self.medications.iter().enumerate() {
            let y = chunks[4].y + i as u16;
            if y >= chunks[4].y + chunks[4].height {
                break;
            }
            let equivalence = if med.diazepam_equivalence > 0.0 {
                format!("{}mg", med.diazepam_equivalence)
            } else {
                "-".to_string()
            };
            let line = Line::from(vec![
                Span::styled("● ", Style::default().fg(hex_color(med.color))),
                Span::styled(
                    format!("{:<width$}", med.name, width = COLUMNS[0].1 - 2),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    format!("{:>width$}", med.half_life_hours, width = COLUMNS[1].1),
                    Style::default().fg(self.theme.text()),
                ),
                Span::styled(
                    format!("{:>width$}", equivalence, width = COLUMNS[2].1),
                    Style::default().fg(self.theme.primary()),
                ),
                Span::styled(
                    format!("{:>width$}", med.unit, width = COLUMNS[3].1),
                    Style::default().fg(self.theme.secondary()),
                ),
            ]);
            buf.set_line(x, y, &line, chunks[4].width);
        }

        Paragraph::new(Span::styled(
            "1mg of the listed drug ≈ the diazepam amount shown. For reference only.",
            Style::default().fg(self.theme.secondary()),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

        render_separator(chunks[8], buf, self.theme);
        render_keybindings(
            chunks[9],
            buf,
            self.theme,
            &[("Tab", "Switch view"), ("?", "Help"), ("q", "Quit")],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_lists_catalog() {
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        ReferenceView::new(Theme::Noir).render(area, &mut buf);
        let content: String = buf.content().iter().map(|c| c.symbol()).collect();

        assert!(content.contains("[Reference]"));
        assert!(content.contains("Alprazolam (Xanax)"));
        assert!(content.contains("20-100"));
        assert!(content.contains("Other"));
    }
}
