//! TUI widgets

pub mod dashboard;
pub mod help;
pub mod reference;
pub mod spinner;
pub mod statistics;
pub mod tabs;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Maximum content width shared by all views
pub const MAX_CONTENT_WIDTH: u16 = 140;

/// Center `area` horizontally, capped at [`MAX_CONTENT_WIDTH`]
pub fn centered_content(area: Rect) -> Rect {
    let width = area.width.min(MAX_CONTENT_WIDTH);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y,
        width,
        height: area.height,
    }
}

pub fn render_separator(area: Rect, buf: &mut Buffer, theme: Theme) {
    let line = "─".repeat(area.width as usize);
    buf.set_string(area.x, area.y, &line, Style::default().fg(theme.border()));
}

/// Centered `key: action` hint line
pub fn render_keybindings(area: Rect, buf: &mut Buffer, theme: Theme, bindings: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(bindings.len() * 3);
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(theme.primary())));
        spans.push(Span::styled(
            format!(": {}", action),
            Style::default().fg(theme.secondary()),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}
