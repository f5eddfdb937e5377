//! Colour themes, auto-detected from the terminal background.

use evmstake_core::{StatusKind, ThemeConfig};
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Detect the terminal theme based on background luminance.
    ///
    /// Must run before raw mode is enabled.
    pub fn detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => {
                tracing::info!("Detected light terminal (luma: {:.2})", luma);
                Theme::Light
            }
            Ok(luma) => {
                tracing::info!("Detected dark terminal (luma: {:.2})", luma);
                Theme::Dark
            }
            Err(e) => {
                tracing::debug!("Could not detect terminal theme: {}, defaulting to dark", e);
                Theme::Dark
            }
        }
    }

    /// Theme from the user's setting; `System` falls back to detection.
    pub fn resolve(setting: ThemeConfig) -> Self {
        match setting {
            ThemeConfig::Light => Theme::Light,
            ThemeConfig::Dark => Theme::Dark,
            ThemeConfig::System => Self::detect(),
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Dark => Palette::dark(),
            Theme::Light => Palette::light(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub fg_dim: Color,
    pub border: Color,
    pub primary: Color,
    pub accent: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,

    pub selection: Color,
    pub muted: Color,
    pub gauge: Color,

    pub tab_active: Color,
    pub tab_inactive: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            fg: Color::White,
            fg_dim: Color::Gray,
            border: Color::DarkGray,
            primary: Color::Cyan,
            accent: Color::Magenta,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            selection: Color::LightBlue,
            muted: Color::DarkGray,
            gauge: Color::Cyan,
            tab_active: Color::Cyan,
            tab_inactive: Color::DarkGray,
        }
    }

    /// Darker, more saturated colours for light backgrounds.
    pub fn light() -> Self {
        Self {
            fg: Color::Black,
            fg_dim: Color::DarkGray,
            border: Color::Gray,
            primary: Color::Rgb(0, 128, 128),
            accent: Color::Rgb(128, 0, 128),
            success: Color::Rgb(0, 128, 0),
            warning: Color::Rgb(184, 134, 11),
            error: Color::Rgb(178, 34, 34),
            selection: Color::Rgb(70, 130, 180),
            muted: Color::Gray,
            gauge: Color::Rgb(0, 128, 128),
            tab_active: Color::Rgb(0, 128, 128),
            tab_inactive: Color::Gray,
        }
    }

    /// Colour of a status line of the given kind.
    pub fn status(&self, kind: StatusKind) -> Color {
        match kind {
            StatusKind::None => self.fg_dim,
            StatusKind::Info => self.primary,
            StatusKind::Success => self.success,
            StatusKind::Error => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_default_is_dark() {
        assert_eq!(Theme::default(), Theme::Dark);
    }

    #[test]
    fn test_explicit_setting_skips_detection() {
        assert_eq!(Theme::resolve(ThemeConfig::Light), Theme::Light);
        assert_eq!(Theme::resolve(ThemeConfig::Dark), Theme::Dark);
    }

    #[test]
    fn test_palettes_have_different_fg() {
        assert_ne!(Palette::dark().fg, Palette::light().fg);
    }

    #[test]
    fn test_status_colours_follow_kind() {
        let palette = Theme::Dark.palette();
        assert_eq!(palette.status(StatusKind::Error), Color::Red);
        assert_eq!(palette.status(StatusKind::Success), Color::Green);
        assert_eq!(palette.status(StatusKind::Info), Color::Cyan);
    }
}
