//! Gemini `generateContent` client in structured-output mode.
//!
//! One call per quiz: the prompt from [`build_prompt`] goes out with a
//! response schema describing an array of questions, and the first candidate's
//! text is parsed straight into [`QuizQuestion`]s.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::constants::constants;
use crate::error::GenerationError;
use crate::prompt::{GenerationRequest, build_prompt};
use crate::quiz::{QuizQuestion, validate_questions};

#[derive(Debug, Clone)]
pub struct GeminiClient {
  http: Client,
  api_key: Option<String>,
  model: String,
  base_url: String,
}

impl GeminiClient {
  /// No request timeout is set: a hung call keeps the busy state until it returns.
  pub fn new(api_key: Option<String>, model: String) -> Self {
    Self { http: Client::new(), api_key, model, base_url: constants().gemini_api_base.clone() }
  }

  /// Point the client at another server, bypassing any configured proxy.
  #[cfg(test)]
  fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.http = Client::builder().no_proxy().build().unwrap();
    self.base_url = base_url.into();
    self
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuizQuestion>, GenerationError> {
    let Some(ref api_key) = self.api_key else {
      return Err(GenerationError::MissingApiKey);
    };

    let url = endpoint(&self.base_url, &self.model);
    let body = request_body(&build_prompt(request));
    info!(model = %self.model, excluded = request.exclude.len(), "gemini: requesting questions");

    let response = self
      .http
      .post(&url)
      .header("x-goog-api-key", api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| GenerationError::Transport(e.to_string()))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| GenerationError::Transport(e.to_string()))?;
    if !status.is_success() {
      warn!(status = status.as_u16(), "gemini: request rejected");
      return Err(GenerationError::Api { status: status.as_u16(), message: api_error_message(&text) });
    }

    let questions = parse_response(&text)?;
    validate_questions(&questions)?;
    info!(count = questions.len(), "gemini: questions received");
    Ok(questions)
  }
}

fn endpoint(base_url: &str, model: &str) -> String {
  format!("{}/v1beta/models/{}:generateContent", base_url.trim_end_matches('/'), model)
}

/// Schema the model's JSON output must conform to.
pub fn response_schema() -> Value {
  json!({
    "type": "ARRAY",
    "items": {
      "type": "OBJECT",
      "properties": {
        "question": { "type": "STRING" },
        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
        "answer": { "type": "STRING" }
      },
      "required": ["question", "options", "answer"]
    }
  })
}

pub fn request_body(prompt: &str) -> Value {
  json!({
    "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
    "generationConfig": {
      "responseMimeType": "application/json",
      "responseSchema": response_schema()
    }
  })
}

// --- Response parsing ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  content: Option<Content>,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
  block_reason: Option<String>,
}

/// Turn a successful `generateContent` body into questions.
pub fn parse_response(body: &str) -> Result<Vec<QuizQuestion>, GenerationError> {
  let response: GenerateContentResponse =
    serde_json::from_str(body).map_err(|e| GenerationError::Parse(format!("invalid response body: {}", e)))?;

  if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
    return Err(GenerationError::Parse(format!("prompt blocked ({})", reason)));
  }

  let Some(candidate) = response.candidates.into_iter().next() else {
    return Err(GenerationError::Parse("response has no candidates".to_string()));
  };
  let text: String =
    candidate.content.map(|c| c.parts.into_iter().filter_map(|p| p.text).collect()).unwrap_or_default();
  if text.trim().is_empty() {
    let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
    return Err(GenerationError::Parse(format!("empty response (finish reason: {})", reason)));
  }

  serde_json::from_str(&text).map_err(|e| GenerationError::Parse(e.to_string()))
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
  let message = serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
    .unwrap_or_else(|| body.to_string());
  message_short(&message)
}

/// Single line, at most 200 chars.
fn message_short(s: &str) -> String {
  let single_line: String = s.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
  single_line.trim().chars().take(200).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::tests::{question, questions};
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::task::JoinHandle;

  /// Serve one canned HTTP response and hand back the raw request (head and body).
  async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<(String, Value)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      let mut buf = Vec::new();
      let mut chunk = [0u8; 4096];
      let (head_end, content_length) = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request head");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
          let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
          let len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
          break (pos + 4, len);
        }
      };
      while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request body");
        buf.extend_from_slice(&chunk[..n]);
      }
      let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
      let request_body: Value = serde_json::from_slice(&buf[head_end..head_end + content_length]).unwrap();

      let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      stream.write_all(response.as_bytes()).await.unwrap();
      stream.shutdown().await.unwrap();
      (head, request_body)
    });
    (base, handle)
  }

  fn test_client(base: &str) -> GeminiClient {
    GeminiClient::new(Some("test-key".to_string()), "gemini-2.5-flash".to_string()).with_base_url(base)
  }

  fn wrap(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }] }).to_string()
  }

  #[test]
  fn endpoint_format() {
    assert_eq!(
      endpoint("https://generativelanguage.googleapis.com/", "gemini-2.5-flash"),
      "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
    );
  }

  #[test]
  fn request_body_uses_structured_output() {
    let body = request_body("hello");
    assert_eq!(body.pointer("/contents/0/parts/0/text").and_then(Value::as_str), Some("hello"));
    assert_eq!(body.pointer("/generationConfig/responseMimeType").and_then(Value::as_str), Some("application/json"));
    let required = body.pointer("/generationConfig/responseSchema/items/required").unwrap();
    assert_eq!(required, &json!(["question", "options", "answer"]));
    assert_eq!(
      body.pointer("/generationConfig/responseSchema/items/properties/options/type").and_then(Value::as_str),
      Some("ARRAY")
    );
  }

  #[test]
  fn parses_question_array() {
    let payload = r#"[{"question":"What?","options":["a","b","c","d"],"answer":"c"}]"#;
    let questions = parse_response(&wrap(payload)).unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].answer, "c");
    assert_eq!(questions[0].answer_index(), Some(2));
  }

  #[test]
  fn joins_split_text_parts() {
    let body = json!({ "candidates": [{ "content": { "parts": [
      { "text": "[{\"question\":\"Q\",\"options\":[\"a\",\"b\"," },
      { "text": "\"c\",\"d\"],\"answer\":\"a\"}]" }
    ] } }] })
    .to_string();
    assert_eq!(parse_response(&body).unwrap().len(), 1);
  }

  #[test]
  fn empty_array_parses_to_no_questions() {
    assert!(parse_response(&wrap("[]")).unwrap().is_empty());
  }

  #[test]
  fn non_conforming_payload_is_a_parse_error() {
    assert!(matches!(parse_response(&wrap("not json")), Err(GenerationError::Parse(_))));
    assert!(matches!(parse_response(&wrap(r#"[{"question":"Q"}]"#)), Err(GenerationError::Parse(_))));
    assert!(matches!(parse_response("<html>"), Err(GenerationError::Parse(_))));
  }

  #[test]
  fn missing_candidates_and_blocks_are_parse_errors() {
    assert!(matches!(parse_response("{}"), Err(GenerationError::Parse(_))));
    let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
    match parse_response(&blocked) {
      Err(GenerationError::Parse(msg)) => assert!(msg.contains("SAFETY")),
      other => panic!("unexpected: {other:?}"),
    }
    let no_text = json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] }).to_string();
    match parse_response(&no_text) {
      Err(GenerationError::Parse(msg)) => assert!(msg.contains("MAX_TOKENS")),
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[test]
  fn api_error_message_extraction() {
    let body = json!({ "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" } });
    assert_eq!(api_error_message(&body.to_string()), "API key not valid.");
    assert_eq!(api_error_message("Bad\ngateway"), "Bad gateway");
    assert_eq!(api_error_message(&"x".repeat(500)).len(), 200);
  }

  #[tokio::test]
  async fn missing_key_fails_before_any_request() {
    let client = GeminiClient::new(None, "gemini-2.5-flash".to_string());
    let request = GenerationRequest { transcript: "t".repeat(200), exclude: Vec::new() };
    assert_eq!(client.generate(&request).await.unwrap_err(), GenerationError::MissingApiKey);
  }

  #[tokio::test]
  async fn success_posts_to_model_endpoint_with_key() {
    let payload = serde_json::to_string(&questions(5)).unwrap();
    let (base, server) = serve_once("200 OK", wrap(&payload)).await;
    let request = GenerationRequest { transcript: "t".repeat(200), exclude: Vec::new() };

    let result = test_client(&base).generate(&request).await.unwrap();
    assert_eq!(result, questions(5));

    let (head, body) = server.await.unwrap();
    assert!(head.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent "), "head: {head}");
    assert!(head.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
    assert_eq!(body.pointer("/generationConfig/responseMimeType").and_then(Value::as_str), Some("application/json"));
  }

  #[tokio::test]
  async fn retake_request_carries_every_excluded_question() {
    let fresh: Vec<QuizQuestion> = (6..=10).map(question).collect();
    let payload = serde_json::to_string(&fresh).unwrap();
    let (base, server) = serve_once("200 OK", wrap(&payload)).await;
    let request = GenerationRequest { transcript: "t".repeat(200), exclude: questions(5) };

    assert_eq!(test_client(&base).generate(&request).await.unwrap(), fresh);

    let (_, body) = server.await.unwrap();
    let prompt = body.pointer("/contents/0/parts/0/text").and_then(Value::as_str).unwrap();
    assert!(prompt.contains("entirely new set of questions"));
    for q in questions(5) {
      assert!(prompt.contains(&format!("- {}", q.question)), "missing {}", q.question);
    }
  }

  #[tokio::test]
  async fn error_status_maps_to_api_error_with_message() {
    let body = json!({ "error": { "code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED" } });
    let (base, _server) = serve_once("403 Forbidden", body.to_string()).await;
    let request = GenerationRequest { transcript: "t".repeat(200), exclude: Vec::new() };

    assert_eq!(
      test_client(&base).generate(&request).await.unwrap_err(),
      GenerationError::Api { status: 403, message: "API key not valid.".to_string() }
    );
  }

  #[tokio::test]
  async fn malformed_batch_is_rejected() {
    let mut batch = questions(5);
    batch[2].answer = "not an option".to_string();
    let (base, _server) = serve_once("200 OK", wrap(&serde_json::to_string(&batch).unwrap())).await;
    let request = GenerationRequest { transcript: "t".repeat(200), exclude: Vec::new() };

    assert!(matches!(
      test_client(&base).generate(&request).await,
      Err(GenerationError::Malformed { index: 3, .. })
    ));
  }
}
