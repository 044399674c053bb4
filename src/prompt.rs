use crate::constants::constants;
use crate::quiz::QuizQuestion;

/// Everything one generation call needs. The exclusion list is advisory: the
/// model is asked to avoid these questions, nothing checks that it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
  pub transcript: String,
  pub exclude: Vec<QuizQuestion>,
}

/// Compose the instruction prompt for one batch of questions.
pub fn build_prompt(request: &GenerationRequest) -> String {
  let c = constants();
  let mut prompt = format!(
    "Based on the following video transcript, generate a quiz with exactly {count} multiple-choice questions. \
     Each question must have exactly {options} distinct options and exactly one unambiguously correct answer. \
     The \"answer\" field must be copied verbatim from one of the options. \
     Cover different parts of the transcript rather than asking several questions about the same passage.",
    count = c.question_count,
    options = c.option_count,
  );

  if !request.exclude.is_empty() {
    prompt.push_str(
      "\n\nIMPORTANT: The user has already answered the questions listed below. \
       Do not repeat them or ask them in different words. Generate an entirely new set of questions.\n",
    );
    for q in &request.exclude {
      prompt.push_str("- ");
      prompt.push_str(&q.question);
      prompt.push('\n');
    }
  }

  prompt.push_str("\n\nTranscript:\n");
  prompt.push_str(&request.transcript);
  prompt
}
