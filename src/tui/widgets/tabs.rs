//! Tab bar widget for view navigation

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::theme::Theme;

/// Available tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Statistics,
    Reference,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Statistics => "Statistics",
            Self::Reference => "Reference",
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Dashboard, Tab::Statistics, Tab::Reference]
    }

    /// Next tab (wrapping)
    pub fn next(self) -> Self {
        match self {
            Self::Dashboard => Self::Statistics,
            Self::Statistics => Self::Reference,
            Self::Reference => Self::Dashboard,
        }
    }

    /// Previous tab (wrapping)
    pub fn prev(self) -> Self {
        match self {
            Self::Dashboard => Self::Reference,
            Self::Statistics => Self::Dashboard,
            Self::Reference => Self::Statistics,
        }
    }

    /// Tab for number key 1-3
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Statistics),
            3 => Some(Self::Reference),
            _ => None,
        }
    }
}

/// Tab bar widget showing available views
pub struct TabBar {
    selected: Tab,
    theme: Theme,
}

impl TabBar {
    pub fn new(selected: Tab, theme: Theme) -> Self {
        Self { selected, theme }
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let total_width: u16 = Tab::all()
            .iter()
            .map(|tab| {
                let extra = if *tab == self.selected { 2 } else { 0 };
                (tab.label().len() + extra) as u16 + 2
            })
            .sum::<u16>()
            .saturating_sub(2);

        let mut x = area.x + (area.width.saturating_sub(total_width)) / 2;

        for tab in Tab::all() {
            let is_selected = *tab == self.selected;
            let display = if is_selected {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            };

            let display_len = display.len() as u16;
            if x + display_len > area.x + area.width {
                break;
            }

            let style = if is_selected {
                Style::default()
                    .fg(self.theme.primary())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.secondary())
            };

            buf.set_string(x, area.y, &display, style);
            x += display_len + 2;
        }
    }
}
