use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::llm::LlmError;
use crate::recognition::ocr::OcrError;

/// Every failure a processing request can end in.
///
/// Components raise the variant that describes what went wrong; the HTTP
/// status and user-facing body are decided once, in [`ApiError`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input, safe to echo back verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("Could not extract meaningful text from the image. Please ensure the image contains clear, readable text and try again.")]
    NoReadableText,

    #[error("OCR processing failed: {0}")]
    Extraction(String),

    /// The model replied, but not in the structure the prompt asked for.
    #[error("Failed to parse AI response: {0}")]
    Parse(String),

    #[error("AI processing failed: {0}")]
    Provider(String),

    #[error("Processing did not finish within {0} seconds")]
    Timeout(u64),

    #[error("File too large. Maximum size is {0}MB.")]
    UploadLimit(usize),

    #[error("Too many requests from this IP, please try again later.")]
    RateLimited,

    #[error("Internal server error")]
    Unhandled(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(secs) => AppError::Timeout(secs),
            other => AppError::Provider(other.to_string()),
        }
    }
}

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Timeout(secs) => AppError::Timeout(secs),
            other => AppError::Extraction(other.to_string()),
        }
    }
}

/// The endpoint a failure happened in, which decides the headline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ProcessImage,
    ProcessText,
}

impl Operation {
    fn title(self) -> &'static str {
        match self {
            Operation::ProcessImage => "Failed to process image",
            Operation::ProcessText => "Failed to process text",
        }
    }

    fn suggestion(self) -> Option<&'static str> {
        match self {
            Operation::ProcessImage => Some(
                "Please try again with a different image or contact support if the issue persists.",
            ),
            Operation::ProcessText => None,
        }
    }

    fn parse_suggestion(self) -> &'static str {
        match self {
            Operation::ProcessImage => "If the problem persists, try with a different image.",
            Operation::ProcessText => "If the problem persists, try rephrasing or shortening the text.",
        }
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            suggestion: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn suggestion(mut self, suggestion: Option<&str>) -> Self {
        self.suggestion = suggestion.map(str::to_string);
        self
    }
}

/// An [`AppError`] bound to the endpoint it surfaced from.
#[derive(Debug)]
pub struct ApiError {
    pub operation: Operation,
    pub error: AppError,
}

impl ApiError {
    pub fn new(operation: Operation, error: impl Into<AppError>) -> Self {
        Self {
            operation,
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            AppError::Validation(_)
            | AppError::NoReadableText
            | AppError::Extraction(_)
            | AppError::UploadLimit(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Parse(_) | AppError::Provider(_) | AppError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        let op = self.operation;
        match &self.error {
            AppError::Validation(_)
            | AppError::NoReadableText
            | AppError::UploadLimit(_)
            | AppError::RateLimited => ErrorBody::new(self.error.to_string()),
            AppError::Extraction(_) => ErrorBody::new(self.error.to_string()).suggestion(Some(
                "Please ensure the image contains clear, readable text and try again.",
            )),
            AppError::Parse(_) => ErrorBody::new("AI response processing failed")
                .details("The AI returned an unexpected format. Please try again.")
                .suggestion(Some(op.parse_suggestion())),
            AppError::Provider(_) | AppError::Timeout(_) => ErrorBody::new(op.title())
                .details(self.error.to_string())
                .suggestion(op.suggestion()),
            AppError::Unhandled(_) => ErrorBody::new("Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.error {
            AppError::Parse(detail) => error!("{:?}: unparseable AI reply: {}", self.operation, detail),
            AppError::Unhandled(err) => error!("{:?}: unhandled error: {:#}", self.operation, err),
            err if status.is_server_error() => error!("{:?}: {}", self.operation, err),
            _ => {}
        }
        (status, Json(self.body())).into_response()
    }
}
