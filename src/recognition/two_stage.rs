use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::interface::{Recognition, RecognitionStrategy};
use super::ocr::OcrEngine;
use crate::error::AppError;
use crate::llm::{GenerationRequest, GenerativeModel};
use crate::models::{RecognitionResult, UploadedImage};
use crate::normalizer::{derive_artifact, ensure_readable};
use crate::prompts::{build_prompt, RequestType};

/// Local OCR first, then a text-only prompt on the recognized text.
pub struct TwoStageRecognizer {
    ocr: Arc<dyn OcrEngine>,
    model: Arc<dyn GenerativeModel>,
    text_model: String,
}

impl TwoStageRecognizer {
    pub fn new(ocr: Arc<dyn OcrEngine>, model: Arc<dyn GenerativeModel>, text_model: String) -> Self {
        Self {
            ocr,
            model,
            text_model,
        }
    }
}

#[async_trait]
impl RecognitionStrategy for TwoStageRecognizer {
    fn name(&self) -> &'static str {
        "two_stage"
    }

    async fn recognize(
        &self,
        image: &UploadedImage,
        request_type: RequestType,
    ) -> Result<Recognition, AppError> {
        info!("Running local OCR on {} bytes ({})", image.bytes.len(), image.mime_type);
        let output = self.ocr.recognize(&image.bytes).await?;
        let text = ensure_readable(&output.text)?;
        info!(
            "OCR completed: {} characters, confidence {:?}",
            text.len(),
            output.confidence
        );

        let request = GenerationRequest::text(build_prompt(request_type, &text))
            .with_model(self.text_model.clone());
        let reply = self.model.generate(request).await?;
        let artifact = derive_artifact(&reply, request_type)?;

        Ok(Recognition {
            result: RecognitionResult {
                extracted_text: text,
                confidence: output.confidence,
            },
            artifact,
        })
    }
}
