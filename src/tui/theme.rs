//! Color palettes for the three settings themes

use ratatui::style::Color;

use crate::types::ThemeName;

/// Terminal palette selected from the user's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    RedAlert,
    Noir,
    Synthwave,
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        match name {
            ThemeName::RedAlert => Self::RedAlert,
            ThemeName::Noir => Self::Noir,
            ThemeName::Synthwave => Self::Synthwave,
        }
    }
}

impl Theme {
    /// Headers, selected tab, key values
    pub fn primary(self) -> Color {
        match self {
            Self::RedAlert => Color::Rgb(0xef, 0x44, 0x44),
            Self::Noir => Color::Rgb(0xe5, 0xe5, 0xe5),
            Self::Synthwave => Color::Rgb(0x06, 0xb6, 0xd4),
        }
    }

    /// Labels, inactive tabs, hints
    pub fn secondary(self) -> Color {
        match self {
            Self::RedAlert => Color::Rgb(0x99, 0x1b, 0x1b),
            Self::Noir => Color::Rgb(0x73, 0x73, 0x73),
            Self::Synthwave => Color::Rgb(0x7c, 0x3a, 0xed),
        }
    }

    /// Box borders and separators
    pub fn border(self) -> Color {
        match self {
            Self::RedAlert => Color::Rgb(0x7f, 0x1d, 0x1d),
            Self::Noir => Color::Rgb(0x40, 0x40, 0x40),
            Self::Synthwave => Color::Rgb(0x1e, 0x3a, 0x8a),
        }
    }

    /// Positive indicators (alcohol-free, trending down)
    pub fn success(self) -> Color {
        match self {
            Self::RedAlert => Color::Rgb(0x22, 0xc5, 0x5e),
            Self::Noir => Color::Rgb(0xff, 0xff, 0xff),
            Self::Synthwave => Color::Rgb(0xd9, 0x46, 0xef),
        }
    }

    /// Chart axes and grid lines
    pub fn grid(self) -> Color {
        match self {
            Self::RedAlert => Color::Rgb(0x33, 0x33, 0x33),
            Self::Noir => Color::Rgb(0x40, 0x40, 0x40),
            Self::Synthwave => Color::Rgb(0x1e, 0x29, 0x3b),
        }
    }

    /// Body text
    pub fn text(self) -> Color {
        Color::White
    }

    /// Negative indicators (alcohol, trending up)
    pub fn warning(self) -> Color {
        match self {
            Self::Noir => Color::Rgb(0xa3, 0xa3, 0xa3),
            _ => Color::Rgb(0xf5, 0x9e, 0x0b),
        }
    }
}

/// Parse `#rrggbb` into an RGB color; anything else falls back to gray
pub fn hex_color(hex: &str) -> Color {
    let parse = |range: std::ops::Range<usize>| {
        hex.get(range).and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (hex.len(), hex.starts_with('#')) {
        (7, true) => match (parse(1..3), parse(3..5), parse(5..7)) {
            (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
            _ => Color::Gray,
        },
        _ => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_alert_palette() {
        let t = Theme::RedAlert;
        assert_eq!(t.primary(), Color::Rgb(239, 68, 68));
        assert_eq!(t.border(), Color::Rgb(127, 29, 29));
        assert_eq!(t.success(), Color::Rgb(34, 197, 94));
    }

    #[test]
    fn test_default_is_red_alert() {
        assert_eq!(Theme::default(), Theme::RedAlert);
        assert_eq!(Theme::from(ThemeName::default()), Theme::RedAlert);
    }

    #[test]
    fn test_from_theme_name() {
        assert_eq!(Theme::from(ThemeName::Noir), Theme::Noir);
        assert_eq!(Theme::from(ThemeName::Synthwave), Theme::Synthwave);
        assert_eq!(Theme::Synthwave.primary(), Color::Rgb(6, 182, 212));
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#ff00ff"), Color::Rgb(255, 0, 255));
        assert_eq!(hex_color("#10b981"), Color::Rgb(16, 185, 129));
        assert_eq!(hex_color("ff00ff"), Color::Gray);
        assert_eq!(hex_color("#zz0000"), Color::Gray);
    }
}
