use ratatui::style::Color;

pub struct Theme {
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  /// Enabled "Previous" control.
  pub primary: Color,
  /// Enabled "Next" control.
  pub secondary: Color,
}

/// Single dark palette; the UI has no theme switching.
pub const DARK: Theme = Theme {
  bg: Color::Rgb(18, 18, 18),
  fg: Color::Rgb(230, 230, 230),
  accent: Color::Rgb(144, 202, 249),
  muted: Color::Rgb(120, 120, 120),
  border: Color::Rgb(66, 66, 66),
  status: Color::Rgb(129, 199, 132),
  error: Color::Rgb(244, 143, 177),
  key_fg: Color::Rgb(18, 18, 18),
  key_bg: Color::Rgb(144, 202, 249),
  primary: Color::Rgb(144, 202, 249),
  secondary: Color::Rgb(206, 147, 216),
};
