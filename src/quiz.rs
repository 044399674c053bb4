use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::constants;
use crate::error::GenerationError;

/// One multiple-choice question, in the JSON shape the model returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
}

impl QuizQuestion {
  /// Index of the option whose text equals `answer`.
  pub fn answer_index(&self) -> Option<usize> {
    self.options.iter().position(|o| *o == self.answer)
  }
}

/// Reject questions the quiz cannot score reliably.
///
/// The model is asked for `option_count` distinct options with the answer copied
/// verbatim; anything else fails the whole batch rather than being mis-scored.
pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), GenerationError> {
  let option_count = constants().option_count;
  for (i, q) in questions.iter().enumerate() {
    let index = i + 1;
    let malformed = |reason: String| GenerationError::Malformed { index, reason };
    if q.question.trim().is_empty() {
      return Err(malformed("empty question text".to_string()));
    }
    if q.options.len() != option_count {
      return Err(malformed(format!("expected {} options, got {}", option_count, q.options.len())));
    }
    let distinct: HashSet<&str> = q.options.iter().map(String::as_str).collect();
    if distinct.len() != q.options.len() {
      return Err(malformed("duplicate options".to_string()));
    }
    if q.answer_index().is_none() {
      return Err(malformed(format!("answer '{}' is not one of the options", q.answer)));
    }
  }
  Ok(())
}

// --- Question-Set Store ---

/// Every question generated for the current video, in generation order.
/// Append-only; used as the exclusion list when asking for new questions.
#[derive(Debug, Default, Clone)]
pub struct QuestionHistory {
  questions: Vec<QuizQuestion>,
}

impl QuestionHistory {
  pub fn extend(&mut self, questions: &[QuizQuestion]) {
    self.questions.extend_from_slice(questions);
  }

  pub fn as_slice(&self) -> &[QuizQuestion] {
    &self.questions
  }

  pub fn len(&self) -> usize {
    self.questions.len()
  }

  pub fn clear(&mut self) {
    self.questions.clear();
  }
}

// --- Render pass ---

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreState {
  pub total: usize,
  pub answered: usize,
  pub correct: usize,
}

impl ScoreState {
  pub fn is_complete(&self) -> bool {
    self.total > 0 && self.answered == self.total
  }
}

/// Per-question lock: a question is answered at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
  Unanswered,
  Locked { selected: usize },
}

/// How one option should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
  /// Question not answered yet; option is selectable.
  Open,
  /// Picked and right.
  SelectedCorrect,
  /// Picked and wrong.
  SelectedIncorrect,
  /// Not picked, but it is the answer (revealed after a wrong pick).
  RevealedCorrect,
  /// Question is locked and this option played no part.
  Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
  /// Question already locked, or indices out of range. Nothing changed.
  Ignored,
  Answered { correct: bool, finished: bool },
}

/// One rendered quiz: the questions, their lock states and the running score.
#[derive(Debug, Clone)]
pub struct Quiz {
  questions: Vec<QuizQuestion>,
  states: Vec<QuestionState>,
  score: ScoreState,
}

impl Quiz {
  /// Start a render pass. Counters reset to `total = questions.len()`.
  pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, GenerationError> {
    if questions.is_empty() {
      return Err(GenerationError::Empty);
    }
    let states = vec![QuestionState::Unanswered; questions.len()];
    let score = ScoreState { total: questions.len(), answered: 0, correct: 0 };
    Ok(Self { questions, states, score })
  }

  pub fn questions(&self) -> &[QuizQuestion] {
    &self.questions
  }

  pub fn score(&self) -> ScoreState {
    self.score
  }

  pub fn state(&self, question: usize) -> Option<QuestionState> {
    self.states.get(question).copied()
  }

  pub fn is_locked(&self, question: usize) -> bool {
    matches!(self.state(question), Some(QuestionState::Locked { .. }))
  }

  /// Answer `question` with `option`. Only the first call per question counts.
  pub fn select(&mut self, question: usize, option: usize) -> SelectOutcome {
    let Some(q) = self.questions.get(question) else { return SelectOutcome::Ignored };
    let Some(picked) = q.options.get(option) else { return SelectOutcome::Ignored };
    if self.states[question] != QuestionState::Unanswered {
      return SelectOutcome::Ignored;
    }

    let correct = *picked == q.answer;
    self.states[question] = QuestionState::Locked { selected: option };
    if correct {
      self.score.correct += 1;
    }
    self.score.answered += 1;
    SelectOutcome::Answered { correct, finished: self.score.is_complete() }
  }

  pub fn option_mark(&self, question: usize, option: usize) -> OptionMark {
    let (Some(q), Some(state)) = (self.questions.get(question), self.state(question)) else {
      return OptionMark::Open;
    };
    let QuestionState::Locked { selected } = state else { return OptionMark::Open };
    let is_answer = q.options.get(option).is_some_and(|o| *o == q.answer);
    match (option == selected, is_answer) {
      (true, true) => OptionMark::SelectedCorrect,
      (true, false) => OptionMark::SelectedIncorrect,
      (false, true) => OptionMark::RevealedCorrect,
      (false, false) => OptionMark::Disabled,
    }
  }
}
