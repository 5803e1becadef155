#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

use study_buddy_backend::build_app;
use study_buddy_backend::config::{Config, RecognitionStrategyKind};
use study_buddy_backend::llm::{GenerationRequest, GenerativeModel, LlmError, ModelInfo};
use study_buddy_backend::recognition::{OcrEngine, OcrError, OcrOutput, TwoStageRecognizer};
use study_buddy_backend::state::AppState;

pub const BOUNDARY: &str = "study-buddy-test-boundary";

/// Scripted model that records every request it receives.
pub struct MockModel {
    reply: Result<String, String>,
    models: Vec<ModelInfo>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockModel {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            models: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.into()),
            models: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_models(reply: impl Into<String>, models: Vec<ModelInfo>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            models,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.reply.clone().map_err(|message| LlmError::Api {
            status: 503,
            message,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        match &self.reply {
            Ok(_) => Ok(self.models.clone()),
            Err(message) => Err(LlmError::Api {
                status: 403,
                message: message.clone(),
            }),
        }
    }
}

/// What a [`MockOcr`] does when asked to read an image.
pub enum OcrScript {
    Read(OcrOutput),
    Crash(String),
    Stall(u64),
}

/// OCR engine following a fixed script.
pub struct MockOcr {
    pub script: OcrScript,
    pub calls: AtomicUsize,
}

impl MockOcr {
    fn scripted(script: OcrScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn reading(text: &str, confidence: f32) -> Arc<Self> {
        Self::scripted(OcrScript::Read(OcrOutput {
            text: text.to_string(),
            confidence: Some(confidence),
        }))
    }

    pub fn crashing(message: &str) -> Arc<Self> {
        Self::scripted(OcrScript::Crash(message.to_string()))
    }

    /// Reports the engine's own deadline as expired.
    pub fn stalling(timeout_secs: u64) -> Arc<Self> {
        Self::scripted(OcrScript::Stall(timeout_secs))
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            OcrScript::Read(output) => Ok(output.clone()),
            OcrScript::Crash(message) => Err(OcrError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                message.clone(),
            ))),
            OcrScript::Stall(secs) => Err(OcrError::Timeout(*secs)),
        }
    }
}

/// App using the combined (single vision call) strategy.
pub fn combined_app(model: Arc<MockModel>) -> Router {
    let config = Config::default();
    assert_eq!(config.recognition_config.strategy, RecognitionStrategyKind::Combined);
    build_app(AppState::from_parts(config, model))
}

/// App using local OCR followed by a text prompt.
pub fn two_stage_app(model: Arc<MockModel>, ocr: Arc<MockOcr>) -> Router {
    let config = Config::default();
    let recognizer = Arc::new(TwoStageRecognizer::new(
        ocr,
        model.clone(),
        config.ai_config.text_model.clone(),
    ));
    build_app(AppState::with_recognizer(config, model, recognizer))
}

/// Build a multipart body with an optional image part and form fields.
pub fn multipart_body(image: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((mime, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"page.img\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn image_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process-image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn text_request(json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process-text")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A few bytes that start like a JPEG; the mocks never decode them.
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
