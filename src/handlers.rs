use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, AppError, Operation};
use crate::llm::GenerationRequest;
use crate::models::{ProcessingRequest, ResponseEnvelope, TextRequestBody, UploadedImage};
use crate::normalizer::derive_artifact;
use crate::prompts::build_prompt;
use crate::state::AppState;
use crate::validation::{validate_mime, validate_size, validate_text};

/// Name of the multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// `POST /process-image`: validate the upload, run the configured
/// recognition strategy, and wrap the result.
pub async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let fail = |e: AppError| ApiError::new(Operation::ProcessImage, e);
    let span = tracing::info_span!("process_image", request_id = %Uuid::new_v4());

    async move {
        let multipart = multipart.map_err(|e| {
            warn!("Rejected non-multipart upload: {}", e);
            fail(AppError::Validation("No image file provided".to_string()))
        })?;
        let max_mb = state.config.system_config.max_upload_mb;
        let request = read_image_request(multipart, max_mb).await.map_err(fail)?;
        let image = request
            .image
            .as_ref()
            .ok_or_else(|| fail(AppError::Validation("No image file provided".to_string())))?;

        info!(
            "Image info: {}, size: {} bytes, file: {}, requestType: {}, difficulty: {}",
            image.mime_type,
            image.bytes.len(),
            image.file_name.as_deref().unwrap_or("-"),
            request.request_type_label,
            request.difficulty
        );

        let recognition = state
            .recognizer
            .recognize(image, request.request_type)
            .await
            .map_err(fail)?;
        info!("Image processed by {} strategy", state.recognizer.name());

        Ok(Json(
            ResponseEnvelope::new(&request.request_type_label, recognition.artifact)
                .with_recognition(recognition.result),
        ))
    }
    .instrument(span)
    .await
}

/// Collect the image and form fields, checking type and size as each part
/// arrives.
async fn read_image_request(
    mut multipart: Multipart,
    max_upload_mb: usize,
) -> Result<ProcessingRequest, AppError> {
    let mut image = None;
    let mut request_type = None;
    let mut difficulty = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, max_upload_mb))? {
        match field.name() {
            Some(IMAGE_FIELD) => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                validate_mime(&mime_type)?;
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_mb))?;
                validate_size(bytes.len(), max_upload_mb)?;
                if bytes.is_empty() {
                    return Err(AppError::Validation("No image file provided".to_string()));
                }
                image = Some(UploadedImage {
                    bytes: bytes.to_vec(),
                    mime_type,
                    file_name,
                });
            }
            Some("requestType") => {
                request_type = Some(field.text().await.map_err(|e| multipart_error(e, max_upload_mb))?);
            }
            Some("difficulty") => {
                difficulty = Some(field.text().await.map_err(|e| multipart_error(e, max_upload_mb))?);
            }
            other => warn!("Ignoring unexpected multipart field {:?}", other),
        }
    }

    let mut request = ProcessingRequest::new(request_type, difficulty);
    request.image = image;
    Ok(request)
}

fn multipart_error(err: MultipartError, max_upload_mb: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadLimit(max_upload_mb)
    } else {
        AppError::Validation(err.body_text())
    }
}

/// `POST /process-text`: validate, prompt, call the text model, wrap.
pub async fn process_text(
    State(state): State<AppState>,
    body: Result<Json<TextRequestBody>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let fail = |e: AppError| ApiError::new(Operation::ProcessText, e);
    let span = tracing::info_span!("process_text", request_id = %Uuid::new_v4());

    async move {
        let Json(body) = body.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                fail(AppError::UploadLimit(state.config.system_config.max_upload_mb))
            } else {
                warn!("Rejected text body: {}", rejection.body_text());
                fail(AppError::Validation(rejection.body_text()))
            }
        })?;

        let text = validate_text(body.text.as_deref()).map_err(fail)?;
        let mut request = ProcessingRequest::new(body.request_type.clone(), body.difficulty.clone());
        request.text = Some(text.to_string());

        info!(
            "Processing {} characters of text, requestType: {}, difficulty: {}",
            text.len(),
            request.request_type_label,
            request.difficulty
        );

        let prompt = build_prompt(request.request_type, text);
        let model = state.config.ai_config.text_model.clone();
        let reply = state
            .model
            .generate(GenerationRequest::text(prompt).with_model(model))
            .await
            .map_err(|e| fail(e.into()))?;
        let artifact = derive_artifact(&reply, request.request_type).map_err(fail)?;

        Ok(Json(ResponseEnvelope::new(&request.request_type_label, artifact)))
    }
    .instrument(span)
    .await
}
