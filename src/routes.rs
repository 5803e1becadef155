use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::handlers::{process_image, process_text};
use crate::llm::{GenerationRequest, LlmError};
use crate::models::now_iso8601;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Diagnostics against the AI provider
        .route("/models", get(list_models))
        .route("/test-ai", get(test_ai))

        // Processing
        .route("/process-image", post(process_image))
        .route("/process-text", post(process_text))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": now_iso8601()
    }))
}

async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let models = state.model.list_models().await.map_err(|e| {
        error!("Error listing models: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to list models", "details": e.to_string()})),
        )
    })?;

    Ok(Json(json!({
        "models": models
            .iter()
            .map(|m| json!({
                "name": m.name,
                "displayName": m.display_name,
                "supportedGenerationMethods": m.supported_generation_methods
            }))
            .collect::<Vec<_>>()
    })))
}

/// Probe the provider: pick the first preferred model that supports
/// `generateContent` and send it a trivial prompt.
async fn test_ai(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let ai_config = &state.config.ai_config;
    info!("Testing AI provider connectivity");
    info!(
        "API key present: {}, length: {}",
        !ai_config.api_key.is_empty(),
        ai_config.api_key.len()
    );

    let diagnostic_failure = |e: LlmError| {
        error!("AI test error: {}", e);
        let mut body = json!({"error": "AI test failed", "details": e.to_string()});
        if !state.config.system_config.is_production() {
            body["trace"] = json!(error_chain(&e));
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
    };

    let available = state.model.list_models().await.map_err(diagnostic_failure)?;

    let working_model = ai_config.test_models.iter().find(|candidate| {
        available
            .iter()
            .any(|m| &m.name == *candidate && m.supports("generateContent"))
    });

    let Some(working_model) = working_model else {
        return Ok(Json(json!({
            "error": "No suitable model found",
            "availableModels": available
                .iter()
                .map(|m| json!({"name": m.name, "methods": m.supported_generation_methods}))
                .collect::<Vec<_>>()
        })));
    };

    let response = state
        .model
        .generate(GenerationRequest::text("Hello, world!").with_model(working_model.clone()))
        .await
        .map_err(diagnostic_failure)?;

    Ok(Json(json!({
        "success": true,
        "response": response,
        "model": working_model,
        "availableModels": available.len()
    })))
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}
