use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::prompts::RequestType;

/// An image received on `/process-image`.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

/// One processing request, after extraction from multipart or JSON.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub image: Option<UploadedImage>,
    pub text: Option<String>,
    pub request_type: RequestType,
    /// The label as the caller sent it; echoed back in the envelope.
    pub request_type_label: String,
    /// Accepted for API compatibility; does not change behaviour.
    pub difficulty: String,
}

impl ProcessingRequest {
    pub fn new(request_type: Option<String>, difficulty: Option<String>) -> Self {
        // Only an absent field defaults; an empty label is echoed back.
        let label = request_type.unwrap_or_else(|| "summarize".to_string());
        Self {
            image: None,
            text: None,
            request_type: RequestType::parse(&label),
            request_type_label: label,
            difficulty: difficulty.unwrap_or_else(|| "medium".to_string()),
        }
    }
}

/// JSON body of `/process-text`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequestBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Text read from an image.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub extracted_text: String,
    /// Mean word confidence (0-100); only the local OCR engine reports one.
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// The task-specific output produced from the text.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedArtifact {
    Prose(String),
    Quiz(Quiz),
}

impl DerivedArtifact {
    /// `aiResponse` is always a string on the wire; quizzes travel as JSON text.
    pub fn into_wire(self) -> String {
        match self {
            DerivedArtifact::Prose(text) => text,
            DerivedArtifact::Quiz(quiz) => serde_json::to_string(&quiz)
                .unwrap_or_else(|_| String::from("{\"questions\":[]}")),
        }
    }
}

/// Successful reply of the processing endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub ai_response: String,
    pub request_type: String,
    pub timestamp: String,
}

impl ResponseEnvelope {
    pub fn new(request_type: &str, artifact: DerivedArtifact) -> Self {
        Self {
            success: true,
            extracted_text: None,
            confidence: None,
            ai_response: artifact.into_wire(),
            request_type: request_type.to_string(),
            timestamp: now_iso8601(),
        }
    }

    pub fn with_recognition(mut self, recognition: RecognitionResult) -> Self {
        self.extracted_text = Some(recognition.extracted_text);
        self.confidence = recognition.confidence;
        self
    }
}

pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
