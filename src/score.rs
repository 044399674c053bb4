/// Final results for a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
  pub correct: usize,
  pub total: usize,
  pub percentage: u32,
  pub title: &'static str,
  pub summary: String,
}

/// Rounded percentage, half up. A zero total scores 0.
pub fn percentage(correct: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  (100.0 * correct as f64 / total as f64).round() as u32
}

/// Title tier for a percentage; first match wins.
pub fn title_for(percentage: u32) -> &'static str {
  match percentage {
    100.. => "Perfect Score!",
    75.. => "Great Job!",
    50.. => "Not Bad!",
    _ => "Better Luck Next Time!",
  }
}

pub fn finalize(correct: usize, total: usize) -> ScoreSummary {
  let percentage = percentage(correct, total);
  ScoreSummary {
    correct,
    total,
    percentage,
    title: title_for(percentage),
    summary: format!("You answered {} out of {} questions correctly ({}%).", correct, total, percentage),
  }
}
