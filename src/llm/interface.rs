use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base64 image payload sent inline with a prompt.
#[derive(Debug, Clone)]
pub struct InlinePayload {
    pub mime_type: String,
    pub data: String,
}

/// A single prompt, optionally with an image, for one model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model override; the client's default model is used when `None`.
    pub model: Option<String>,
    pub prompt: String,
    pub image: Option<InlinePayload>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image(mut self, image: InlinePayload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Catalog entry returned by the provider's model listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to AI provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider did not respond within {0} seconds")]
    Timeout(u64),

    #[error("AI provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("AI provider returned no content{}", .0.as_ref().map(|r| format!(" (blocked: {})", r)).unwrap_or_default())]
    EmptyResponse(Option<String>),
}

/// A hosted generative-language model.
///
/// Stateless: every call carries its full prompt; nothing is remembered
/// between calls.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;

    /// List the models available to the configured credentials.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;
}
