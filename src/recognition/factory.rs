use std::sync::Arc;
use tracing::info;

use super::combined::CombinedRecognizer;
use super::interface::RecognitionStrategy;
use super::ocr::TesseractEngine;
use super::two_stage::TwoStageRecognizer;
use crate::config::{AiConfig, RecognitionConfig, RecognitionStrategyKind};
use crate::llm::GenerativeModel;

/// Factory for the recognition strategy serving `/process-image`.
pub struct RecognitionFactory;

impl RecognitionFactory {
    /// Create the strategy named in configuration.
    ///
    /// # Arguments
    /// * `recognition_config` - Strategy choice and local OCR settings
    /// * `ai_config` - Model names for the vision and text calls
    /// * `model` - Shared client for the hosted model
    pub fn create(
        recognition_config: &RecognitionConfig,
        ai_config: &AiConfig,
        model: Arc<dyn GenerativeModel>,
    ) -> Arc<dyn RecognitionStrategy> {
        info!("Initializing recognition strategy: {:?}", recognition_config.strategy);

        match recognition_config.strategy {
            RecognitionStrategyKind::Combined => Arc::new(CombinedRecognizer::new(
                model,
                ai_config.vision_model.clone(),
            )),
            RecognitionStrategyKind::TwoStage => {
                let ocr = TesseractEngine::from_config(recognition_config);
                info!(
                    "Local OCR: command={}, languages={}",
                    recognition_config.ocr_command, recognition_config.ocr_languages
                );
                Arc::new(TwoStageRecognizer::new(
                    Arc::new(ocr),
                    model,
                    ai_config.text_model.clone(),
                ))
            }
        }
    }
}
