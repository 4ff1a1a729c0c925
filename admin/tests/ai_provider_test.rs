//! Completion provider tests against a mock server

mod common;

use ckn_admin::config::ProviderKind;
use ckn_admin::error::AdminError;
use common::{deepseek_reply, gemini_reply, TestApp};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_gemini_returns_candidate_text() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .and(query_param("key", "gemini-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "出題" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("{\"questions\": []}")))
        .expect(1)
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Gemini)).unwrap();
    assert_eq!(provider.name(), "gemini");
    let text = provider.complete("出題").await.unwrap();
    assert_eq!(text, "{\"questions\": []}");
}

#[tokio::test]
async fn test_gemini_joins_parts() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"questions\":" }, { "text": " []}" }] }
            }]
        })))
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Gemini)).unwrap();
    assert_eq!(provider.complete("p").await.unwrap(), "{\"questions\": []}");
}

#[tokio::test]
async fn test_gemini_rate_limit_is_provider_error() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Gemini)).unwrap();
    match provider.complete("p").await {
        Err(AdminError::Provider(message)) => {
            assert!(message.contains("429"));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_without_candidates() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Gemini)).unwrap();
    assert!(matches!(
        provider.complete("p").await,
        Err(AdminError::Provider(_))
    ));
}

#[tokio::test]
async fn test_deepseek_chat_request() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer deepseek-key"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "messages": [{ "role": "user", "content": "出題" }],
            "max_tokens": 2000,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_reply("答案")))
        .expect(1)
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Deepseek)).unwrap();
    assert_eq!(provider.name(), "deepseek");
    assert_eq!(provider.complete("出題").await.unwrap(), "答案");
}

#[tokio::test]
async fn test_deepseek_empty_content_is_error() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepseek_reply("   ")))
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Deepseek)).unwrap();
    assert!(matches!(
        provider.complete("p").await,
        Err(AdminError::Provider(_))
    ));
}

#[tokio::test]
async fn test_deepseek_server_error() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&app.server)
        .await;

    let provider = app.state.provider(Some(ProviderKind::Deepseek)).unwrap();
    match provider.complete("p").await {
        Err(AdminError::Provider(message)) => assert!(message.contains("503")),
        other => panic!("expected provider error, got {other:?}"),
    }
}
