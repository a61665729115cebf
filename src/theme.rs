use ratatui::style::Color;

/// A named colour palette for the whole UI.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub info: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  /// Search hit emphasis.
  pub mark_fg: Color,
  pub mark_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Crimson",
    bg: Color::Rgb(24, 20, 22),
    fg: Color::Rgb(230, 224, 226),
    accent: Color::Rgb(229, 57, 53),
    muted: Color::Rgb(130, 118, 122),
    border: Color::Rgb(70, 58, 62),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(92, 30, 34),
    stripe_bg: Color::Rgb(30, 25, 27),
    status: Color::Rgb(255, 183, 77),
    error: Color::Rgb(255, 82, 82),
    info: Color::Rgb(129, 199, 132),
    key_fg: Color::Rgb(24, 20, 22),
    key_bg: Color::Rgb(229, 57, 53),
    mark_fg: Color::Rgb(24, 20, 22),
    mark_bg: Color::Rgb(255, 213, 79),
  },
  Theme {
    name: "Mocha",
    bg: Color::Rgb(30, 30, 46),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(203, 166, 247),
    muted: Color::Rgb(127, 132, 156),
    border: Color::Rgb(69, 71, 90),
    highlight_fg: Color::Rgb(30, 30, 46),
    highlight_bg: Color::Rgb(203, 166, 247),
    stripe_bg: Color::Rgb(36, 36, 54),
    status: Color::Rgb(249, 226, 175),
    error: Color::Rgb(243, 139, 168),
    info: Color::Rgb(166, 227, 161),
    key_fg: Color::Rgb(30, 30, 46),
    key_bg: Color::Rgb(137, 180, 250),
    mark_fg: Color::Rgb(30, 30, 46),
    mark_bg: Color::Rgb(250, 179, 135),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 242),
    fg: Color::Rgb(48, 44, 40),
    accent: Color::Rgb(196, 52, 40),
    muted: Color::Rgb(140, 132, 122),
    border: Color::Rgb(214, 206, 194),
    highlight_fg: Color::Rgb(250, 248, 242),
    highlight_bg: Color::Rgb(196, 52, 40),
    stripe_bg: Color::Rgb(242, 238, 228),
    status: Color::Rgb(178, 110, 20),
    error: Color::Rgb(190, 30, 45),
    info: Color::Rgb(46, 125, 50),
    key_fg: Color::Rgb(250, 248, 242),
    key_bg: Color::Rgb(48, 44, 40),
    mark_fg: Color::Rgb(48, 44, 40),
    mark_bg: Color::Rgb(255, 224, 130),
  },
];

/// Position of the theme called `name` (case-insensitive), defaulting to the first.
pub fn theme_index(name: &str) -> usize {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name)).unwrap_or(0)
}
