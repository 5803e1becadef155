//! Turns raw model replies into checked values.
//!
//! Model output is best-effort text. Prompt wording lives in `prompts`, and
//! every assumption about the shape of the reply lives here.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::AppError;
use crate::models::{DerivedArtifact, Quiz};
use crate::prompts::RequestType;

/// Minimum characters of readable text an image must yield.
pub const MIN_EXTRACTED_CHARS: usize = 5;

const QUIZ_OPTION_COUNT: usize = 4;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?[ \t]*\r?\n?").expect("valid fence regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    fence_re().replace_all(raw, "").trim().to_string()
}

/// Collapse every run of whitespace (newlines included) to one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// Reject text that is too short to be a real transcription.
pub fn ensure_readable(text: &str) -> Result<String, AppError> {
    let normalized = normalize_whitespace(text);
    if normalized.chars().count() < MIN_EXTRACTED_CHARS {
        return Err(AppError::NoReadableText);
    }
    Ok(normalized)
}

/// The combined image prompt's reply, read as far as the transcription.
///
/// `aiResponse` stays raw until [`CombinedReply::artifact`] so the caller can
/// reject unreadable text before judging the rest of the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedReply {
    pub extracted_text: String,
    ai_response: Option<Value>,
}

/// Parse the `{"extractedText": ..., "aiResponse": ...}` reply of the
/// combined prompt. `extractedText` is required here; `aiResponse` is
/// required by [`CombinedReply::artifact`].
pub fn parse_combined_reply(raw: &str) -> Result<CombinedReply, AppError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AppError::Parse(format!("reply is not valid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(AppError::Parse("reply is not a JSON object".to_string()));
    };

    let extracted_text = match object.remove("extractedText") {
        Some(Value::String(text)) => text,
        Some(Value::Null) => String::new(),
        Some(_) => return Err(AppError::Parse("extractedText is not a string".to_string())),
        None => return Err(AppError::Parse("missing key extractedText".to_string())),
    };

    Ok(CombinedReply {
        extracted_text,
        ai_response: object.remove("aiResponse"),
    })
}

impl CombinedReply {
    /// Interpret `aiResponse` for the requested task.
    pub fn artifact(&self, request_type: RequestType) -> Result<DerivedArtifact, AppError> {
        let ai_response = self
            .ai_response
            .as_ref()
            .ok_or_else(|| AppError::Parse("missing key aiResponse".to_string()))?;

        if request_type.is_quiz() {
            let quiz = match ai_response {
                Value::String(text) => parse_quiz(text)?,
                other => quiz_from_value(other.clone())?,
            };
            return Ok(DerivedArtifact::Quiz(quiz));
        }
        match ai_response {
            Value::String(text) => Ok(DerivedArtifact::Prose(text.clone())),
            Value::Null => Err(AppError::Parse("aiResponse is empty".to_string())),
            other => Ok(DerivedArtifact::Prose(other.to_string())),
        }
    }
}

/// Parse a quiz reply, tolerating code fences around the JSON.
pub fn parse_quiz(raw: &str) -> Result<Quiz, AppError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AppError::Parse(format!("quiz is not valid JSON: {}", e)))?;
    quiz_from_value(value)
}

fn quiz_from_value(value: Value) -> Result<Quiz, AppError> {
    let quiz: Quiz = serde_json::from_value(value)
        .map_err(|e| AppError::Parse(format!("quiz does not match schema: {}", e)))?;
    validate_quiz(&quiz)?;
    Ok(quiz)
}

fn validate_quiz(quiz: &Quiz) -> Result<(), AppError> {
    if quiz.questions.is_empty() {
        return Err(AppError::Parse("quiz has no questions".to_string()));
    }
    for (i, q) in quiz.questions.iter().enumerate() {
        if q.options.len() != QUIZ_OPTION_COUNT {
            return Err(AppError::Parse(format!(
                "question {} has {} options, expected {}",
                i + 1,
                q.options.len(),
                QUIZ_OPTION_COUNT
            )));
        }
        if q.correct >= QUIZ_OPTION_COUNT {
            return Err(AppError::Parse(format!(
                "question {} has correct index {} out of range",
                i + 1,
                q.correct
            )));
        }
    }
    Ok(())
}

/// Interpret a text-only reply: prose as-is, quizzes parsed and checked.
pub fn derive_artifact(raw: &str, request_type: RequestType) -> Result<DerivedArtifact, AppError> {
    if request_type.is_quiz() {
        return parse_quiz(raw).map(DerivedArtifact::Quiz);
    }
    if raw.trim().is_empty() {
        return Err(AppError::Parse("reply is empty".to_string()));
    }
    Ok(DerivedArtifact::Prose(raw.to_string()))
}
