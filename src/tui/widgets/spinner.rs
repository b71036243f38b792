//! Loading spinner widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::theme::Theme;

/// Spinner animation frames
const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

const APP_NAME: &str = "soberstats";
const TAGLINE: &str = "Medication, alcohol and mood log";

/// Loading stage for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStage {
    Connecting,
    Loading,
}

impl LoadingStage {
    pub fn message(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Loading => "Loading logs...",
        }
    }
}

pub struct Spinner {
    frame: usize,
    stage: LoadingStage,
    theme: Theme,
}

impl Spinner {
    pub fn new(frame: usize, stage: LoadingStage, theme: Theme) -> Self {
        Self {
            frame,
            stage,
            theme,
        }
    }

    pub fn current_char(&self) -> char {
        SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()]
    }

    /// Advance to next frame, returning the new frame index
    pub fn next_frame(frame: usize) -> usize {
        (frame + 1) % SPINNER_FRAMES.len()
    }
}

impl Widget for Spinner {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 5 || area.width < 35 {
            return;
        }

        // name, tagline, blank, spinner
        let center_y = area.y + area.height / 2;

        let name_y = center_y.saturating_sub(2);
        let name_x = area.x + (area.width.saturating_sub(APP_NAME.len() as u16)) / 2;
        buf.set_string(
            name_x,
            name_y,
            APP_NAME,
            Style::default()
                .fg(self.theme.primary())
                .add_modifier(Modifier::BOLD),
        );

        let tag_y = name_y + 1;
        let tag_x = area.x + (area.width.saturating_sub(TAGLINE.len() as u16)) / 2;
        buf.set_string(
            tag_x,
            tag_y,
            TAGLINE,
            Style::default().fg(self.theme.secondary()),
        );

        let spinner_text = format!("{} {}", self.current_char(), self.stage.message());
        let spinner_y = tag_y + 2;
        let spinner_x =
            area.x + (area.width.saturating_sub(spinner_text.chars().count() as u16)) / 2;
        buf.set_string(
            spinner_x,
            spinner_y,
            &spinner_text,
            Style::default().fg(self.theme.text()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_current_char_wraps() {
        let spinner = Spinner::new(0, LoadingStage::Loading, Theme::default());
        assert_eq!(spinner.current_char(), '⠋');

        let spinner = Spinner::new(10, LoadingStage::Loading, Theme::default());
        assert_eq!(spinner.current_char(), '⠋');
    }

    #[test]
    fn test_next_frame() {
        assert_eq!(Spinner::next_frame(0), 1);
        assert_eq!(Spinner::next_frame(9), 0);
    }

    #[test]
    fn test_spinner_renders_stage() {
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        Spinner::new(0, LoadingStage::Connecting, Theme::default()).render(area, &mut buf);
        let content: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(content.contains("soberstats"));
        assert!(content.contains("Connecting..."));
    }
}
