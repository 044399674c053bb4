//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Gemini
  pub gemini_api_base: String,
  pub gemini_model: String,
  pub api_key_env: String,

  // Quiz shape
  pub question_count: usize,
  pub option_count: usize,

  // Input validation
  pub min_transcript_chars: usize,
  pub video_id_len: usize,

  // Player embed
  pub embed_base: String,
  pub watch_base: String,
  pub embed_allow: String,

  // UI
  pub error_display_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
