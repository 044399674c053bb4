//! Quiz session state machine.
//!
//! Owns everything the quiz flow mutates: the active transcript/video pair,
//! the question history, the rendered quiz and its results. The UI feeds it
//! user intents (submit, retake, restart, pick an option) and the result of
//! the one outstanding generation call; it never touches the network itself.

use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::error::{GenerationError, SessionError, ValidationError};
use crate::prompt::GenerationRequest;
use crate::quiz::{QuestionHistory, Quiz, QuizQuestion, SelectOutcome};
use crate::score::{ScoreSummary, finalize};
use crate::video::{VideoEmbed, extract_video_id};

/// Transcript and video identifier of a successful submit. Kept as one value
/// so they are always set and cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSource {
  pub transcript: String,
  pub video_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Busy {
  #[default]
  Idle,
  Submitting,
  Retaking,
}

/// What the in-flight request will do on success.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
  Submit(ActiveSource),
  Retake,
}

#[derive(Debug, Default)]
pub struct Session {
  active: Option<ActiveSource>,
  history: QuestionHistory,
  embed: Option<VideoEmbed>,
  quiz: Option<Quiz>,
  results: Option<ScoreSummary>,
  /// Error block shown in place of the quiz after a failed generation.
  output_error: Option<String>,
  /// Inline message next to the form after a rejected submit.
  form_error: Option<String>,
  busy: Busy,
  pending: Option<Pending>,
}

/// Check the form inputs. Returns the video identifier and the trimmed transcript.
pub fn validate_input(url: &str, transcript: &str) -> Result<(String, String), ValidationError> {
  let video_id = extract_video_id(url.trim()).ok_or(ValidationError::InvalidUrl)?;
  let transcript = transcript.trim();
  let min = constants().min_transcript_chars;
  let actual = transcript.chars().count();
  if actual < min {
    return Err(ValidationError::TranscriptTooShort { min, actual });
  }
  Ok((video_id, transcript.to_string()))
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Accessors ---

  pub fn active(&self) -> Option<&ActiveSource> {
    self.active.as_ref()
  }

  pub fn history(&self) -> &QuestionHistory {
    &self.history
  }

  pub fn embed(&self) -> Option<&VideoEmbed> {
    self.embed.as_ref()
  }

  pub fn quiz(&self) -> Option<&Quiz> {
    self.quiz.as_ref()
  }

  pub fn results(&self) -> Option<&ScoreSummary> {
    self.results.as_ref()
  }

  pub fn output_error(&self) -> Option<&str> {
    self.output_error.as_deref()
  }

  pub fn form_error(&self) -> Option<&str> {
    self.form_error.as_deref()
  }

  pub fn busy(&self) -> Busy {
    self.busy
  }

  pub fn is_busy(&self) -> bool {
    self.busy != Busy::Idle
  }

  pub fn can_retake(&self) -> bool {
    !self.is_busy() && self.active.is_some()
  }

  pub fn clear_form_error(&mut self) {
    self.form_error = None;
  }

  // --- Transitions ---

  /// Validate the form and start a fresh quiz for a new video.
  ///
  /// On a validation failure only the inline form error changes. Otherwise the
  /// previous output, history and active source are cleared, the new video is
  /// embedded, and the returned request carries an empty exclusion list.
  pub fn begin_submit(&mut self, url: &str, transcript: &str) -> Result<GenerationRequest, SessionError> {
    if self.is_busy() {
      return Err(SessionError::Busy);
    }
    let (video_id, transcript) = match validate_input(url, transcript) {
      Ok(valid) => valid,
      Err(e) => {
        debug!(err = %e, "session: submit rejected");
        self.form_error = Some(e.to_string());
        return Err(e.into());
      }
    };

    info!(video_id = %video_id, chars = transcript.chars().count(), "session: submit");
    self.form_error = None;
    self.clear_output();
    self.history.clear();
    self.active = None;
    self.embed = Some(VideoEmbed::new(video_id.clone()));
    self.busy = Busy::Submitting;
    self.pending = Some(Pending::Submit(ActiveSource { transcript: transcript.clone(), video_id }));
    Ok(GenerationRequest { transcript, exclude: Vec::new() })
  }

  /// Ask for a new set of questions for the active video, excluding every
  /// question generated so far. The embedded video is left alone.
  pub fn begin_retake(&mut self) -> Result<GenerationRequest, SessionError> {
    if self.is_busy() {
      return Err(SessionError::Busy);
    }
    let Some(ref active) = self.active else {
      return Err(SessionError::NoActiveVideo);
    };
    info!(video_id = %active.video_id, excluded = self.history.len(), "session: retake");
    let request = GenerationRequest { transcript: active.transcript.clone(), exclude: self.history.as_slice().to_vec() };
    self.busy = Busy::Retaking;
    self.pending = Some(Pending::Retake);
    Ok(request)
  }

  /// Apply the result of the outstanding generation call.
  ///
  /// A result arriving with nothing pending (e.g. after a restart) is dropped.
  pub fn complete(&mut self, result: Result<Vec<QuizQuestion>, GenerationError>) {
    let Some(pending) = self.pending.take() else {
      debug!("session: dropping result with no pending request");
      return;
    };
    self.busy = Busy::Idle;

    match result.and_then(Quiz::new) {
      Ok(quiz) => {
        self.history.extend(quiz.questions());
        if let Pending::Submit(source) = pending {
          self.active = Some(source);
        }
        info!(questions = quiz.questions().len(), history = self.history.len(), "session: quiz ready");
        self.clear_output();
        self.quiz = Some(quiz);
      }
      Err(e) => {
        warn!(err = %e, "session: generation failed");
        self.clear_output();
        self.output_error = Some(match e {
          GenerationError::Empty => e.to_string(),
          other => format!("Failed to generate quiz. {}", other),
        });
      }
    }
  }

  /// Answer one question. When the last question locks, the results are computed.
  pub fn select(&mut self, question: usize, option: usize) -> SelectOutcome {
    let Some(ref mut quiz) = self.quiz else { return SelectOutcome::Ignored };
    let outcome = quiz.select(question, option);
    if let SelectOutcome::Answered { finished: true, .. } = outcome {
      let score = quiz.score();
      let summary = finalize(score.correct, score.total);
      info!(correct = score.correct, total = score.total, percentage = summary.percentage, "session: quiz finished");
      self.results = Some(summary);
    }
    outcome
  }

  /// Back to the initial idle state. Always succeeds, even mid-request: the
  /// late result is discarded by [`Session::complete`].
  pub fn restart(&mut self) {
    info!("session: restart");
    *self = Self::default();
  }

  fn clear_output(&mut self) {
    self.quiz = None;
    self.results = None;
    self.output_error = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::tests::questions;

  const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

  fn transcript() -> String {
    "word ".repeat(40)
  }

  fn submitted() -> Session {
    let mut session = Session::new();
    session.begin_submit(URL, &transcript()).unwrap();
    session.complete(Ok(questions(5)));
    session
  }

  #[test]
  fn short_transcript_is_rejected_before_any_request() {
    let mut session = Session::new();
    let err = session.begin_submit(URL, &format!("  {}  ", "a".repeat(99))).unwrap_err();
    assert_eq!(err, SessionError::Validation(ValidationError::TranscriptTooShort { min: 100, actual: 99 }));
    assert!(!session.is_busy());
    assert!(session.embed().is_none());
    assert!(session.form_error().is_some());
  }

  #[test]
  fn invalid_url_leaves_output_untouched() {
    let mut session = submitted();
    session.select(0, 1);
    let err = session.begin_submit("https://example.com", &transcript()).unwrap_err();
    assert_eq!(err, SessionError::Validation(ValidationError::InvalidUrl));
    assert_eq!(session.quiz().unwrap().score().answered, 1);
    assert_eq!(session.history().len(), 5);
    assert!(session.active().is_some());
  }

  #[test]
  fn submit_embeds_video_and_stores_source_on_success() {
    let mut session = Session::new();
    let request = session.begin_submit(URL, &format!("\n{}\n", transcript())).unwrap();
    assert!(request.exclude.is_empty());
    assert_eq!(request.transcript, transcript().trim());
    assert_eq!(session.busy(), Busy::Submitting);
    assert_eq!(session.embed().map(|e| e.video_id.as_str()), Some("dQw4w9WgXcQ"));
    assert!(session.active().is_none());

    session.complete(Ok(questions(5)));
    assert_eq!(session.busy(), Busy::Idle);
    let active = session.active().unwrap();
    assert_eq!(active.video_id, "dQw4w9WgXcQ");
    assert_eq!(active.transcript, transcript().trim());
    assert_eq!(session.history().len(), 5);
    assert_eq!(session.quiz().unwrap().score().total, 5);
  }

  #[test]
  fn second_submit_clears_history_and_output() {
    let mut session = submitted();
    session.begin_retake().unwrap();
    session.complete(Ok(questions(5)));
    assert_eq!(session.history().len(), 10);

    session.begin_submit("https://youtu.be/abcdefghijk", &transcript()).unwrap();
    assert_eq!(session.history().len(), 0);
    assert!(session.quiz().is_none());
    assert!(session.active().is_none());
  }

  #[test]
  fn retake_sends_full_history_and_keeps_source() {
    let mut session = submitted();
    let before = session.active().cloned();
    let request = session.begin_retake().unwrap();
    assert_eq!(request.exclude, questions(5));
    assert_eq!(request.transcript, transcript().trim());
    assert_eq!(session.busy(), Busy::Retaking);
    assert_eq!(session.active().cloned(), before);

    let mut fresh = questions(10);
    let fresh = fresh.split_off(5);
    session.complete(Ok(fresh.clone()));
    assert_eq!(session.active().cloned(), before);
    assert_eq!(session.history().len(), 10);
    assert_eq!(session.quiz().unwrap().questions(), fresh.as_slice());
    assert_eq!(session.quiz().unwrap().score().answered, 0);
    assert_eq!(session.embed().map(|e| e.video_id.as_str()), Some("dQw4w9WgXcQ"));
  }

  #[test]
  fn retake_requires_active_source() {
    let mut session = Session::new();
    assert_eq!(session.begin_retake().unwrap_err(), SessionError::NoActiveVideo);
    assert!(!session.can_retake());
  }

  #[test]
  fn busy_blocks_overlapping_requests() {
    let mut session = submitted();
    session.begin_retake().unwrap();
    assert!(!session.can_retake());
    assert_eq!(session.begin_retake().unwrap_err(), SessionError::Busy);
    assert_eq!(session.begin_submit(URL, &transcript()).unwrap_err(), SessionError::Busy);
  }

  #[test]
  fn failed_generation_shows_error_and_keeps_session_state() {
    let mut session = submitted();
    session.begin_retake().unwrap();
    session.complete(Err(GenerationError::Transport("connection reset".to_string())));
    assert_eq!(session.busy(), Busy::Idle);
    assert!(session.quiz().is_none());
    assert!(session.output_error().unwrap().contains("connection reset"));
    assert_eq!(session.history().len(), 5);
    assert!(session.active().is_some());
    assert!(session.can_retake());
  }

  #[test]
  fn empty_result_is_reported() {
    let mut session = Session::new();
    session.begin_submit(URL, &transcript()).unwrap();
    session.complete(Ok(Vec::new()));
    assert!(session.quiz().is_none());
    assert!(session.output_error().unwrap().contains("too short or unclear"));
    assert!(session.active().is_none());
    assert_eq!(session.history().len(), 0);
  }

  #[test]
  fn results_appear_only_when_every_question_is_answered() {
    let mut session = submitted();
    for q in 0..4 {
      session.select(q, 1);
      assert!(session.results().is_none());
    }
    session.select(4, 0);
    let results = session.results().unwrap();
    assert_eq!((results.correct, results.total, results.percentage), (4, 5, 80));
    assert_eq!(results.title, "Great Job!");
  }

  #[test]
  fn restart_clears_everything() {
    let mut session = submitted();
    session.select(0, 1);
    session.begin_retake().unwrap();
    session.complete(Ok(questions(5)));
    session.restart();
    assert!(session.active().is_none());
    assert_eq!(session.history().len(), 0);
    assert!(session.embed().is_none());
    assert!(session.quiz().is_none());
    assert!(session.results().is_none());
    assert!(session.output_error().is_none());
    assert_eq!(session.busy(), Busy::Idle);
  }

  #[test]
  fn result_after_restart_is_discarded() {
    let mut session = Session::new();
    session.begin_submit(URL, &transcript()).unwrap();
    session.restart();
    session.complete(Ok(questions(5)));
    assert!(session.quiz().is_none());
    assert_eq!(session.history().len(), 0);
    assert!(session.active().is_none());
  }
}
