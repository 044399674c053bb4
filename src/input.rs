use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Editable text with a char-indexed cursor and a horizontal scroll offset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextField {
  pub text: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextField {
  pub fn with_text(text: impl Into<String>) -> Self {
    let text = text.into();
    let cursor = text.chars().count();
    Self { text, cursor, scroll: 0 }
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  fn len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn insert_char(&mut self, c: char) {
    let byte_idx = char_to_byte_index(&self.text, self.cursor);
    self.text.insert(byte_idx, c);
    self.cursor += 1;
  }

  pub fn insert_str(&mut self, s: &str) {
    let byte_idx = char_to_byte_index(&self.text, self.cursor);
    self.text.insert_str(byte_idx, s);
    self.cursor += s.chars().count();
  }

  pub fn backspace(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  pub fn delete(&mut self) {
    if self.cursor < self.len() {
      let byte_idx = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(byte_idx);
    }
  }

  pub fn left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn right(&mut self) {
    if self.cursor < self.len() {
      self.cursor += 1;
    }
  }

  pub fn home(&mut self) {
    self.cursor = 0;
  }

  pub fn end(&mut self) {
    self.cursor = self.len();
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  /// Shared editing keys. Returns `false` for keys the field doesn't handle.
  fn handle_edit_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char(c) => self.insert_char(c),
      KeyCode::Backspace => self.backspace(),
      KeyCode::Delete => self.delete(),
      KeyCode::Left => self.left(),
      KeyCode::Right => self.right(),
      KeyCode::Home => self.home(),
      KeyCode::End => self.end(),
      _ => return false,
    }
    true
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('o') => app.open_video(),
      KeyCode::Char('r') => app.trigger_retake(),
      KeyCode::Char('n') => app.restart(),
      _ => {}
    }
    return;
  }

  match key.code {
    KeyCode::Tab => {
      app.focus_next();
      return;
    }
    KeyCode::BackTab => {
      app.focus_prev();
      return;
    }
    _ => {}
  }

  match app.focus {
    Focus::Url => handle_url_key(app, key),
    Focus::Transcript => handle_transcript_key(app, key),
    Focus::Quiz => handle_quiz_key(app, key),
  }
}

/// Bracketed paste goes into the focused field. URLs are single-line.
pub fn handle_paste(app: &mut App, text: &str) {
  match app.focus {
    Focus::Url => {
      let single_line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
      app.url.insert_str(single_line.trim());
    }
    Focus::Transcript => app.transcript.insert_str(&text.replace("\r\n", "\n")),
    Focus::Quiz => {}
  }
  app.session.clear_form_error();
}

fn handle_url_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter | KeyCode::Down => app.focus = Focus::Transcript,
    KeyCode::Esc => {
      if !app.url.is_empty() {
        app.url.clear();
      } else {
        app.should_quit = true;
      }
    }
    _ => {
      if app.url.handle_edit_key(key) {
        app.session.clear_form_error();
      }
    }
  }
}

fn handle_transcript_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => app.transcript.insert_char('\n'),
    KeyCode::Enter => app.trigger_submit(),
    KeyCode::Up if app.transcript.cursor == 0 => app.focus = Focus::Url,
    KeyCode::Esc => {
      if !app.transcript.is_empty() {
        app.transcript.clear();
      } else {
        app.should_quit = true;
      }
    }
    _ => {
      if app.transcript.handle_edit_key(key) {
        app.session.clear_form_error();
      }
    }
  }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.move_question(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_question(-1),
    KeyCode::Right | KeyCode::Char('l') => app.move_option(1),
    KeyCode::Left | KeyCode::Char('h') => app.move_option(-1),
    KeyCode::Enter | KeyCode::Char(' ') => app.select_highlighted(),
    KeyCode::Char(c @ '1'..='9') => app.select_option(c as usize - '1' as usize),
    KeyCode::Char(c @ 'a'..='d') => app.select_option(c as usize - 'a' as usize),
    KeyCode::Char('r') => app.trigger_retake(),
    KeyCode::Esc => app.focus = Focus::Url,
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- TextField ---

  #[test]
  fn text_field_editing() {
    let mut field = TextField::with_text("helo");
    assert_eq!(field.cursor, 4);
    field.left();
    field.insert_char('l');
    assert_eq!(field.text, "hello");
    field.home();
    field.delete();
    assert_eq!(field.text, "ello");
    field.end();
    field.backspace();
    assert_eq!(field.text, "ell");
    field.right();
    assert_eq!(field.cursor, 3);
  }

  #[test]
  fn text_field_multibyte_insert() {
    let mut field = TextField::with_text("日本");
    field.left();
    field.insert_str("é語");
    assert_eq!(field.text, "日é語本");
    assert_eq!(field.cursor, 3);
    field.clear();
    assert_eq!(field, TextField::default());
  }
}
