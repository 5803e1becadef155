use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

use super::interface::{GenerationRequest, GenerativeModel, LlmError, ModelInfo};
use super::types::{
    ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse, InlineData,
    ListModelsResponse, Part,
};
use crate::config::AiConfig;

/// Client for Google's Gemini `generativelanguage` REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        default_model: String,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        info!(
            "Initialized GeminiClient: base_url={}, default_model={}, timeout={}s",
            base_url, default_model, timeout_secs
        );
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, LlmError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.text_model.clone(),
            config.request_timeout_secs,
        )
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Http(err)
        }
    }

    /// Turn a non-2xx reply into an `Api` error, preferring the provider's own message.
    async fn check_status(response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) => match envelope.error.status {
                Some(code) => format!("{} ({})", envelope.error.message, code),
                None => envelope.error.message,
            },
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            Self::model_path(model)
        );

        let mut parts = vec![Part::Text {
            text: request.prompt,
        }];
        if let Some(image) = request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        debug!("Calling generateContent on {}", model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;
        let reply: GenerateContentResponse =
            response.json().await.map_err(|e| self.map_send_error(e))?;

        let text = reply
            .text()
            .ok_or_else(|| LlmError::EmptyResponse(reply.block_reason()))?;
        debug!("Model {} replied with {} characters", model, text.len());
        Ok(text)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;
        let listing: ListModelsResponse =
            response.json().await.map_err(|e| self.map_send_error(e))?;
        Ok(listing.models)
    }
}
