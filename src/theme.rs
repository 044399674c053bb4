use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub status: Color,
  pub error: Color,
  pub correct: Color,
  pub incorrect: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Pastel",
    bg: Color::Rgb(30, 30, 46),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(203, 166, 247),
    muted: Color::Rgb(127, 132, 156),
    border: Color::Rgb(88, 91, 112),
    highlight_fg: Color::Rgb(30, 30, 46),
    highlight_bg: Color::Rgb(180, 190, 254),
    status: Color::Rgb(137, 220, 235),
    error: Color::Rgb(243, 139, 168),
    correct: Color::Rgb(166, 227, 161),
    incorrect: Color::Rgb(243, 139, 168),
    key_fg: Color::Rgb(30, 30, 46),
    key_bg: Color::Rgb(203, 166, 247),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 244, 237),
    fg: Color::Rgb(87, 82, 121),
    accent: Color::Rgb(144, 122, 169),
    muted: Color::Rgb(152, 147, 165),
    border: Color::Rgb(206, 202, 205),
    highlight_fg: Color::Rgb(250, 244, 237),
    highlight_bg: Color::Rgb(86, 148, 159),
    status: Color::Rgb(40, 105, 131),
    error: Color::Rgb(180, 99, 122),
    correct: Color::Rgb(40, 105, 131),
    incorrect: Color::Rgb(180, 99, 122),
    key_fg: Color::Rgb(250, 244, 237),
    key_bg: Color::Rgb(144, 122, 169),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    status: Color::Yellow,
    error: Color::Red,
    correct: Color::Green,
    incorrect: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn index_of(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
