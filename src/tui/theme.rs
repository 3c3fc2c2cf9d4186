//! Color palette for the selection screen.

use ratatui::style::Color;

/// Colors used by the selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Borders and headers
    pub primary: Color,
    /// Cursor highlight
    pub highlight: Color,
    /// Rows marked for deletion
    pub danger: Color,
    /// Rows kept
    pub success: Color,
    /// Hints and secondary text
    pub dim: Color,
    /// Text drawn on the highlight color
    pub inverted_fg: Color,
}

impl Theme {
    /// High-contrast dark palette (default).
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            highlight: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::DarkGray,
            inverted_fg: Color::Black,
        }
    }

    /// High-contrast light palette.
    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            highlight: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            dim: Color::Gray,
            inverted_fg: Color::White,
        }
    }

    /// Palette guessed from the terminal, dark when unsure.
    #[must_use]
    pub fn auto() -> Self {
        if is_light_terminal(std::env::var("COLORFGBG").ok().as_deref()) {
            Self::light()
        } else {
            Self::dark()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// `COLORFGBG` is `fg;bg`; background 7 and 9-15 are light colors.
fn is_light_terminal(colorfgbg: Option<&str>) -> bool {
    colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.parse::<u32>().ok())
        .is_some_and(|bg| bg >= 7 && bg != 8)
}
