use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use study_buddy_backend::llm::{
    GeminiClient, GenerationRequest, GenerativeModel, InlinePayload, LlmError,
};

fn client(server: &MockServer, timeout_secs: u64) -> GeminiClient {
    GeminiClient::new(
        server.uri(),
        "test-key".to_string(),
        "gemini-2.5-flash-image-preview".to_string(),
        timeout_secs,
    )
    .unwrap()
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn generate_sends_prompt_and_image_to_the_requested_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [
                {"text": "Describe this"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0K"}}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("A diagram.")))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::text("Describe this")
        .with_model("gemini-1.5-flash")
        .with_image(InlinePayload {
            mime_type: "image/png".to_string(),
            data: "iVBORw0K".to_string(),
        });
    let text = client(&server, 5).generate(request).await.unwrap();

    assert_eq!(text, "A diagram.");
}

#[tokio::test]
async fn generate_falls_back_to_the_default_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server, 5)
        .generate(GenerationRequest::text("hi"))
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = client(&server, 5)
        .generate(GenerationRequest::text("hi"))
        .await
        .unwrap_err();

    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid. (INVALID_ARGUMENT)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn blocked_prompt_is_an_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client(&server, 5)
        .generate(GenerationRequest::text("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::EmptyResponse(Some(ref reason)) if reason == "SAFETY"));
    assert_eq!(err.to_string(), "AI provider returned no content (blocked: SAFETY)");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client(&server, 1)
        .generate(GenerationRequest::text("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Timeout(1)));
}

#[tokio::test]
async fn list_models_reads_the_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/gemini-1.5-flash",
                    "displayName": "Gemini 1.5 Flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = client(&server, 5).list_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].display_name.as_deref(), Some("Gemini 1.5 Flash"));
    assert!(models[0].supports("generateContent"));
    assert!(!models[1].supports("generateContent"));
}
