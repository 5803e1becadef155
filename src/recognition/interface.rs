use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{DerivedArtifact, RecognitionResult, UploadedImage};
use crate::prompts::RequestType;

/// Text read from an image together with what was derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub result: RecognitionResult,
    pub artifact: DerivedArtifact,
}

/// Turns an uploaded image into extracted text plus the requested artifact.
///
/// Exactly one implementation serves a running process; it is chosen from
/// configuration at startup.
#[async_trait]
pub trait RecognitionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(
        &self,
        image: &UploadedImage,
        request_type: RequestType,
    ) -> Result<Recognition, AppError>;
}
