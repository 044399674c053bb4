use thiserror::Error;

/// Input rejected before any network call. Shown inline next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Please enter a valid YouTube URL.")]
  InvalidUrl,
  #[error("Transcript is too short ({actual} characters). Please paste at least {min} characters.")]
  TranscriptTooShort { min: usize, actual: usize },
}

/// A generation attempt that produced nothing renderable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
  #[error("No API key configured. Set GEMINI_API_KEY or add api_key to prefs.toml.")]
  MissingApiKey,
  #[error("Request failed: {0}")]
  Transport(String),
  #[error("Model API returned {status}: {message}")]
  Api { status: u16, message: String },
  #[error("Could not parse model response: {0}")]
  Parse(String),
  #[error("Question {index} is malformed: {reason}")]
  Malformed { index: usize, reason: String },
  #[error("No questions were generated. The transcript may be too short or unclear.")]
  Empty,
}

/// Why a session transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("A request is already in progress.")]
  Busy,
  #[error("Generate a quiz before asking for new questions.")]
  NoActiveVideo,
}
