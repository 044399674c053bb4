use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::error::{GenerationError, SessionError};
use crate::gemini::GeminiClient;
use crate::input::TextField;
use crate::prompt::GenerationRequest;
use crate::quiz::{QuizQuestion, SelectOutcome};
use crate::session::{Busy, Session};
use crate::theme::{self, THEMES};
use crate::video;

// --- Types ---

pub type GenerationResult = Result<Vec<QuizQuestion>, GenerationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Url,
  Transcript,
  Quiz,
}

/// Highlighted question and option in the quiz pane.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QuizCursor {
  pub question: usize,
  pub option: usize,
}

pub struct App {
  pub url: TextField,
  pub transcript: TextField,
  pub focus: Focus,
  pub theme_index: usize,
  pub session: Session,
  pub cursor: QuizCursor,
  pub last_error: Option<String>,
  pub should_quit: bool,
  client: GeminiClient,
  config: Config,
  generation_rx: Option<oneshot::Receiver<GenerationResult>>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(client: GeminiClient, config: Config, url: Option<String>, transcript: Option<String>) -> Self {
    let theme_index = theme::index_of(config.theme_name.as_deref());
    let url = url.map(TextField::with_text).unwrap_or_default();
    let transcript = transcript.map(TextField::with_text).unwrap_or_default();
    let focus = if url.is_empty() { Focus::Url } else { Focus::Transcript };

    Self {
      url,
      transcript,
      focus,
      theme_index,
      session: Session::new(),
      cursor: QuizCursor::default(),
      last_error: None,
      should_quit: false,
      client,
      config,
      generation_rx: None,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static theme::Theme {
    // Safety: theme_index comes from theme::index_of or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn model(&self) -> &str {
    self.client.model()
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Busy indicator text while a request is in flight.
  pub fn status_message(&self) -> Option<&'static str> {
    match self.session.busy() {
      Busy::Idle => None,
      Busy::Submitting => Some("Generating quiz…"),
      Busy::Retaking => Some("Generating new questions…"),
    }
  }

  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after `error_display_secs`.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_display_secs)
    {
      self.clear_error();
    }
  }

  // --- Focus ---

  fn focus_order(&self) -> Vec<Focus> {
    let mut order = vec![Focus::Url, Focus::Transcript];
    if self.session.quiz().is_some() {
      order.push(Focus::Quiz);
    }
    order
  }

  pub fn focus_next(&mut self) {
    let order = self.focus_order();
    let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = order[(idx + 1) % order.len()];
  }

  pub fn focus_prev(&mut self) {
    let order = self.focus_order();
    let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = order[(idx + order.len() - 1) % order.len()];
  }

  // --- Session transitions ---

  pub fn trigger_submit(&mut self) {
    match self.session.begin_submit(&self.url.text, &self.transcript.text) {
      Ok(request) => {
        self.clear_error();
        self.cursor = QuizCursor::default();
        self.spawn_generation(request);
      }
      // Validation errors are rendered next to the form by the session.
      Err(SessionError::Validation(_)) => {}
      Err(e) => self.set_error(e.to_string()),
    }
  }

  pub fn trigger_retake(&mut self) {
    match self.session.begin_retake() {
      Ok(request) => {
        self.clear_error();
        self.spawn_generation(request);
      }
      Err(e) => self.set_error(e.to_string()),
    }
  }

  /// Clear the session and both input fields. Any in-flight result is dropped.
  pub fn restart(&mut self) {
    self.generation_rx = None;
    self.session.restart();
    self.url.clear();
    self.transcript.clear();
    self.cursor = QuizCursor::default();
    self.focus = Focus::Url;
    self.clear_error();
  }

  fn spawn_generation(&mut self, request: GenerationRequest) {
    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.generate(&request).await);
    });
    self.generation_rx = Some(rx);
  }

  pub fn check_pending(&mut self) {
    let Some(mut rx) = self.generation_rx.take() else { return };
    match rx.try_recv() {
      Ok(result) => self.finish_generation(result),
      Err(oneshot::error::TryRecvError::Empty) => {
        self.generation_rx = Some(rx);
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        warn!("app: generation task ended without a result");
        self.finish_generation(Err(GenerationError::Transport("generation task failed".to_string())));
      }
    }
  }

  fn finish_generation(&mut self, result: GenerationResult) {
    self.session.complete(result);
    self.cursor = QuizCursor::default();
    if self.session.quiz().is_some() {
      self.focus = Focus::Quiz;
    } else if self.focus == Focus::Quiz {
      self.focus = Focus::Transcript;
    }
  }

  // --- Quiz navigation ---

  fn option_count(&self, question: usize) -> usize {
    self.session.quiz().and_then(|q| q.questions().get(question)).map_or(0, |q| q.options.len())
  }

  pub fn move_question(&mut self, delta: isize) {
    let Some(quiz) = self.session.quiz() else { return };
    let count = quiz.questions().len();
    if count == 0 {
      return;
    }
    self.cursor.question = (self.cursor.question as isize + delta).rem_euclid(count as isize) as usize;
    self.cursor.option = self.cursor.option.min(self.option_count(self.cursor.question).saturating_sub(1));
  }

  pub fn move_option(&mut self, delta: isize) {
    let count = self.option_count(self.cursor.question);
    if count == 0 {
      return;
    }
    self.cursor.option = (self.cursor.option as isize + delta).rem_euclid(count as isize) as usize;
  }

  pub fn select_highlighted(&mut self) {
    self.select_option(self.cursor.option);
  }

  /// Answer the highlighted question, then jump to the next unanswered one.
  pub fn select_option(&mut self, option: usize) {
    let question = self.cursor.question;
    if let SelectOutcome::Answered { correct, finished } = self.session.select(question, option) {
      info!(question, option, correct, "app: answered");
      self.cursor.option = option;
      if !finished {
        self.advance_to_unanswered();
      }
    }
  }

  fn advance_to_unanswered(&mut self) {
    let Some(quiz) = self.session.quiz() else { return };
    let count = quiz.questions().len();
    let next = (1..count).map(|step| (self.cursor.question + step) % count).find(|&q| !quiz.is_locked(q));
    if let Some(q) = next {
      self.cursor = QuizCursor { question: q, option: 0 };
    }
  }

  pub fn open_video(&mut self) {
    let Some(embed) = self.session.embed() else { return };
    let url = embed.embed_url();
    if let Err(e) = video::open_in_browser(&url) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }
}
