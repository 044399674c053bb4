use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Focus};
use crate::quiz::{OptionMark, Quiz};
use crate::session::Busy;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Greedy word wrap by display width. Words wider than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let width = width.max(1);
  let mut lines = Vec::new();
  let mut current = String::new();
  let mut current_w = 0;

  for word in text.split_whitespace() {
    let word_w = word.width();
    let sep = usize::from(!current.is_empty());
    if current_w + sep + word_w <= width {
      if sep == 1 {
        current.push(' ');
      }
      current.push_str(word);
      current_w += sep + word_w;
      continue;
    }
    if !current.is_empty() {
      lines.push(std::mem::take(&mut current));
      current_w = 0;
    }
    for c in word.chars() {
      let w = c.width().unwrap_or(0);
      if current_w + w > width && !current.is_empty() {
        lines.push(std::mem::take(&mut current));
        current_w = 0;
      }
      current.push(c);
      current_w += w;
    }
  }
  if !current.is_empty() || lines.is_empty() {
    lines.push(current);
  }
  lines
}

fn rounded_block<'a>(title: impl Into<Line<'a>>, theme: &Theme, active: bool) -> Block<'a> {
  let color = if active { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
    .padding(Padding::horizontal(1))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(8), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  let [form_area, quiz_area] =
    Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(main_area);

  render_header(frame, app, header_area);
  render_form(frame, app, form_area);
  render_quiz_pane(frame, app, quiz_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ✎ ytquiz ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let right_text = format!("{}  v{} ", app.model(), env!("CARGO_PKG_VERSION"));
  let right_w = right_text.width() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(right_w), width: right_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

// --- Form ---

fn render_form(frame: &mut Frame, app: &mut App, area: Rect) {
  let [url_area, transcript_area, video_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Min(5), Constraint::Length(6)]).areas(area);

  render_url_input(frame, app, url_area);
  render_transcript_input(frame, app, transcript_area);
  render_video(frame, app, video_area);
}

fn render_url_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Url;
  let block = rounded_block(" Video URL ", theme, focused);

  let inner_w = area.width.saturating_sub(4) as usize;
  let field = &mut app.url;
  let cursor_col = display_width(&field.text, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let scroll = field.scroll;
  let visible: String = field
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = c.width().unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block);
  frame.render_widget(paragraph, area);

  if focused && inner_w > 0 {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_transcript_input(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Transcript;
  let field = &app.transcript;
  let count = field.text.trim().chars().count();
  let title = Line::from(vec![
    Span::raw(" Transcript "),
    Span::styled(format!("{} chars ", count), Style::default().fg(theme.muted)),
  ]);
  let block = rounded_block(title, theme, focused);

  let inner_w = area.width.saturating_sub(4) as usize;
  let inner_h = area.height.saturating_sub(2) as usize;

  let mut lines: Vec<Line> = Vec::new();
  if let Some(err) = app.session.form_error() {
    for l in wrap_text(&format!("⚠ {}", err), inner_w) {
      lines.push(Line::from(Span::styled(l, Style::default().fg(theme.error))));
    }
  }

  if field.is_empty() && !focused {
    lines.push(Line::from(Span::styled("Paste the video transcript here.", Style::default().fg(theme.muted))));
  } else {
    // Mark the cursor inline; the transcript is usually pasted, so the tail is what matters.
    let mut text = field.text.clone();
    if focused {
      let byte_idx = crate::input::char_to_byte_index(&text, field.cursor);
      text.insert(byte_idx, '▏');
    }
    let body: Vec<Line> = text
      .split('\n')
      .flat_map(|para| wrap_text(para, inner_w))
      .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.fg))))
      .collect();
    let keep = inner_h.saturating_sub(lines.len());
    let skip = body.len().saturating_sub(keep);
    lines.extend(body.into_iter().skip(skip));
  }

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_video(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(" Video ", theme, false);
  let inner_w = area.width.saturating_sub(4) as usize;

  let lines = match app.session.embed() {
    Some(embed) => vec![
      Line::from(vec![
        Span::styled("ID      ", Style::default().fg(theme.muted)),
        Span::styled(embed.video_id.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
      ]),
      Line::from(Span::styled(
        truncate_str(&embed.embed_url(), inner_w),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      )),
      Line::from(Span::styled(
        truncate_str(&format!("allow: {}", embed.allow()), inner_w),
        Style::default().fg(theme.muted),
      )),
      Line::from(Span::styled(truncate_str(&embed.watch_url(), inner_w), Style::default().fg(theme.muted))),
    ],
    None => vec![Line::from(Span::styled("No video loaded.", Style::default().fg(theme.muted)))],
  };
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

// --- Quiz ---

fn render_quiz_pane(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();

  if let Some(quiz) = app.session.quiz() {
    let results_h = if app.session.results().is_some() { 5 } else { 0 };
    let [list_area, results_area] =
      Layout::vertical([Constraint::Min(3), Constraint::Length(results_h)]).areas(area);
    render_questions(frame, app, quiz, list_area);
    if results_h > 0 {
      render_results(frame, app, results_area);
    }
    return;
  }

  if let Some(err) = app.session.output_error() {
    let paragraph = Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled(err.to_string(), Style::default().fg(theme.error))),
      Line::from(""),
      Line::from(Span::styled("Press Enter in the transcript to try again.", Style::default().fg(theme.muted))),
    ])
    .wrap(Wrap { trim: true })
    .block(rounded_block(" Error ", theme, false).border_style(Style::default().fg(theme.error)));
    frame.render_widget(paragraph, area);
    return;
  }

  render_welcome(frame, app, area);
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let headline = if app.session.busy() == Busy::Submitting { "Writing your quiz…" } else { "Welcome to ytquiz" };
  let text = vec![
    Line::from(""),
    Line::from(Span::styled(headline, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Paste a YouTube link and its transcript.", Style::default().fg(theme.fg))),
    Line::from(Span::styled("Get five questions. See how much stuck.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Press Enter in the transcript box to generate.", Style::default().fg(theme.muted))),
  ];
  let paragraph =
    Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded_block("", theme, false));
  frame.render_widget(paragraph, area);
}

fn option_style(theme: &Theme, mark: OptionMark, highlighted: bool) -> (&'static str, Style) {
  let (marker, style) = match mark {
    OptionMark::Open => ("( )", Style::default().fg(theme.fg)),
    OptionMark::SelectedCorrect => ("(✔)", Style::default().fg(theme.correct).add_modifier(Modifier::BOLD)),
    OptionMark::SelectedIncorrect => ("(✘)", Style::default().fg(theme.incorrect).add_modifier(Modifier::BOLD)),
    OptionMark::RevealedCorrect => (" ✔ ", Style::default().fg(theme.correct)),
    OptionMark::Disabled => ("   ", Style::default().fg(theme.muted)),
  };
  if highlighted && mark == OptionMark::Open {
    return (marker, Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  }
  (marker, style)
}

fn render_questions(frame: &mut Frame, app: &App, quiz: &Quiz, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Quiz;
  let score = quiz.score();
  let title = Line::from(vec![
    Span::raw(" Quiz "),
    Span::styled(format!("{}/{} answered ", score.answered, score.total), Style::default().fg(theme.muted)),
  ]);
  let block = rounded_block(title, theme, focused);
  let inner_w = area.width.saturating_sub(4) as usize;
  let inner_h = area.height.saturating_sub(2) as usize;

  let mut lines: Vec<Line> = Vec::new();
  let mut current_block = (0usize, 0usize);

  for (qi, q) in quiz.questions().iter().enumerate() {
    let start = lines.len();
    let is_current = focused && qi == app.cursor.question;
    let number = format!("{}. ", qi + 1);
    let q_style = Style::default().fg(if is_current { theme.accent } else { theme.fg }).add_modifier(Modifier::BOLD);
    for (i, l) in wrap_text(&q.question, inner_w.saturating_sub(number.width())).into_iter().enumerate() {
      let lead = if i == 0 { number.clone() } else { " ".repeat(number.width()) };
      lines.push(Line::from(Span::styled(format!("{}{}", lead, l), q_style)));
    }

    for (oi, option) in q.options.iter().enumerate() {
      let mark = quiz.option_mark(qi, oi);
      let highlighted = is_current && oi == app.cursor.option;
      let (marker, style) = option_style(theme, mark, highlighted);
      let label = format!("  {} {}. ", marker, (b'a' + oi as u8) as char);
      let indent = " ".repeat(label.width());
      for (i, l) in wrap_text(option, inner_w.saturating_sub(label.width())).into_iter().enumerate() {
        let lead = if i == 0 { label.clone() } else { indent.clone() };
        lines.push(Line::from(Span::styled(format!("{}{}", lead, l), style)));
      }
    }
    lines.push(Line::from(""));
    if qi == app.cursor.question {
      current_block = (start, lines.len());
    }
  }

  // Keep the highlighted question in view.
  let (start, end) = current_block;
  let scroll = end.saturating_sub(inner_h).min(start);

  let paragraph = Paragraph::new(lines).block(block).scroll((scroll as u16, 0));
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(results) = app.session.results() else { return };
  let lines = vec![
    Line::from(Span::styled(results.title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(results.summary.clone(), Style::default().fg(theme.fg))),
    Line::from(Span::styled("^r new questions   ^n start over", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(rounded_block(" Results ", theme, true));
  frame.render_widget(paragraph, area);
}

// --- Status & footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = app.status_message() {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(quiz) = app.session.quiz() {
    let score = quiz.score();
    let history = app.session.history().len();
    let video_id = app.session.active().map_or("", |a| a.video_id.as_str());
    (
      format!(" {} correct so far · {} questions asked about {}", score.correct, history, video_id),
      Style::default().fg(theme.muted),
    )
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let busy = app.session.is_busy();
  let mut keys: Vec<(&str, &str)> = match app.focus {
    Focus::Url => vec![("Enter", "Next"), ("Tab", "Focus")],
    Focus::Transcript => {
      let mut k = vec![];
      if !busy {
        k.push(("Enter", "Generate"));
      }
      k.push(("M-Enter", "Newline"));
      k.push(("Tab", "Focus"));
      k
    }
    Focus::Quiz => vec![("j/k", "Question"), ("h/l", "Option"), ("Enter", "Answer"), ("Tab", "Focus")],
  };
  if app.session.can_retake() {
    keys.push(("^r", "New questions"));
  }
  if app.session.embed().is_some() {
    keys.push(("^o", "Open video"));
  }
  keys.push(("^n", "Restart"));
  keys.push(("^t", "Theme"));

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let label_w = (theme_label.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width.saturating_sub(label_w), width: label_w, ..area };
  frame.render_widget(right, right_area);
}
