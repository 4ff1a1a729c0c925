//! Common test utilities for integration tests
//!
//! Every test gets its own `wiremock` server standing in for the hosted
//! backend and both completion providers.

#![allow(dead_code)]

use ckn_admin::config::AppConfig;
use ckn_admin::state::AppState;
use ckn_admin::supabase::SupabaseClient;
use secrecy::SecretString;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "test-anon-key";
pub const SERVICE_KEY: &str = "test-service-key";
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Test application wrapper
pub struct TestApp {
    pub server: MockServer,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let state = AppState::new(test_config(&server.uri())).expect("Failed to build state");
        Self { server, state }
    }

    pub fn anon(&self) -> SupabaseClient {
        self.state.supabase_anon().expect("anon client")
    }

    pub fn service(&self) -> SupabaseClient {
        self.state.supabase_service().expect("service client")
    }

    /// Accept a password sign-in for `email` as `user_id`
    pub async fn mock_sign_in(&self, email: &str, user_id: Uuid) {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(wiremock::matchers::body_partial_json(json!({ "email": email })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json(email, user_id)))
            .mount(&self.server)
            .await;
    }
}

/// Configuration pointing every remote at the mock server
pub fn test_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::defaults().expect("Failed to build default config");
    config.supabase.url = base_url.to_string();
    config.supabase.anon_key = Some(SecretString::new(ANON_KEY.to_string()));
    config.supabase.service_role_key = Some(SecretString::new(SERVICE_KEY.to_string()));
    config.ai.gemini.base_url = base_url.to_string();
    config.ai.gemini.api_key = Some(SecretString::new("gemini-key".to_string()));
    config.ai.gemini.delay_ms = 0;
    config.ai.deepseek.base_url = base_url.to_string();
    config.ai.deepseek.api_key = Some(SecretString::new("deepseek-key".to_string()));
    config.ai.deepseek.delay_ms = 0;
    config
}

pub fn session_json(email: &str, user_id: Uuid) -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": user_id,
            "email": email,
            "email_confirmed_at": "2025-10-01T08:00:00Z",
            "created_at": "2025-10-01T07:59:00Z"
        }
    })
}

/// Three well-formed questions as a provider would return them
pub fn quiz_json() -> Value {
    let question = json!({
        "question": "哪種營養素對身體最重要？",
        "options": ["A. 蛋白質", "B. 碳水化合物", "C. 維生素", "D. 所有營養素都重要"],
        "correct_answer": "D",
        "explanation": "所有營養素都有其獨特的功能。"
    });
    json!({ "questions": [question.clone(), question.clone(), question] })
}

/// Gemini response body carrying `text`
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

/// DeepSeek response body carrying `text`
pub fn deepseek_reply(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
}
