use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use tracing::{error, info};

use super::interface::{Recognition, RecognitionStrategy};
use crate::error::AppError;
use crate::llm::{GenerationRequest, GenerativeModel, InlinePayload};
use crate::models::{RecognitionResult, UploadedImage};
use crate::normalizer::{ensure_readable, parse_combined_reply};
use crate::prompts::{build_combined_prompt, RequestType};

/// Transcribes the image and derives the artifact in one vision call.
pub struct CombinedRecognizer {
    model: Arc<dyn GenerativeModel>,
    vision_model: String,
}

impl CombinedRecognizer {
    pub fn new(model: Arc<dyn GenerativeModel>, vision_model: String) -> Self {
        Self {
            model,
            vision_model,
        }
    }
}

#[async_trait]
impl RecognitionStrategy for CombinedRecognizer {
    fn name(&self) -> &'static str {
        "combined"
    }

    async fn recognize(
        &self,
        image: &UploadedImage,
        request_type: RequestType,
    ) -> Result<Recognition, AppError> {
        info!(
            "Processing image with {} (single call): {}, {} bytes",
            self.vision_model,
            image.mime_type,
            image.bytes.len()
        );

        let payload = InlinePayload {
            mime_type: image.mime_type.clone(),
            data: STANDARD.encode(&image.bytes),
        };
        let request = GenerationRequest::text(build_combined_prompt(request_type))
            .with_model(self.vision_model.clone())
            .with_image(payload);

        let reply = self.model.generate(request).await?;
        info!("Vision reply received ({} characters), parsing", reply.len());

        let log_raw = |e: AppError| {
            error!("Raw reply that failed to parse: {}", reply);
            e
        };
        let parsed = parse_combined_reply(&reply).map_err(log_raw)?;
        // A blank image often comes back with an empty or missing answer too.
        ensure_readable(&parsed.extracted_text)?;
        info!("Extracted text length: {} characters", parsed.extracted_text.len());
        let artifact = parsed.artifact(request_type).map_err(log_raw)?;

        Ok(Recognition {
            result: RecognitionResult {
                extracted_text: parsed.extracted_text,
                confidence: None,
            },
            artifact,
        })
    }
}
