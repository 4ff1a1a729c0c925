//! Backend client tests against a mock server

mod common;

use ckn_admin::error::AdminError;
use ckn_admin::repositories::{DailyContentRepository, GroupRepository, QuizRepository};
use ckn_admin_shared::quiz::manual_template_questions;
use ckn_admin_shared::validation::Credentials;
use ckn_admin_shared::{DailyContent, Group, Quiz};
use common::{TestApp, ACCESS_TOKEN, ANON_KEY, SERVICE_KEY};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_select_sends_keys_and_filters() {
    let app = TestApp::new().await;
    let group_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/groups"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", format!("Bearer {ANON_KEY}").as_str()))
        .and(query_param("invite_code", "eq.TEST001"))
        .and(query_param("select", "id,name,invite_code"))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": group_id,
            "name": "測試小組",
            "invite_code": "TEST001"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let group: Group = GroupRepository::find_by_invite_code(&app.anon(), "TEST001")
        .await
        .unwrap();
    assert_eq!(group.id, group_id);
    assert_eq!(group.name, "測試小組");
}

#[tokio::test]
async fn test_single_row_miss_is_not_found() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/daily_content"))
        .and(query_param("day_number", "eq.22"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&app.server)
        .await;

    let result = DailyContentRepository::get_by_day(&app.anon(), 22).await;
    assert!(matches!(result, Err(AdminError::NotFound(_))));
}

#[tokio::test]
async fn test_permission_errors_map_to_unauthorized() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key"
        })))
        .mount(&app.server)
        .await;

    let result = QuizRepository::list_all(&app.anon()).await;
    match result {
        Err(AdminError::Unauthorized(message)) => assert_eq!(message, "Invalid API key"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_keep_status() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&app.server)
        .await;

    let row = DailyContent {
        day_number: 1,
        title: "t".to_string(),
        content: "c".to_string(),
    };
    let result = DailyContentRepository::upsert(&app.anon(), &row).await;
    assert!(matches!(result, Err(AdminError::Backend { status: 409, .. })));
}

#[tokio::test]
async fn test_upsert_uses_conflict_target() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/quizzes"))
        .and(query_param("on_conflict", "day_number"))
        .and(header(
            "prefer",
            "resolution=merge-duplicates,return=representation",
        ))
        .and(body_partial_json(json!({ "day_number": 4 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "day_number": 4 }])))
        .expect(1)
        .mount(&app.server)
        .await;

    let quiz = Quiz::new(manual_template_questions());
    QuizRepository::upsert(&app.service(), 4, &quiz).await.unwrap();
}

#[tokio::test]
async fn test_sign_in_and_session_bearer() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();
    app.mock_sign_in("test55@andywong.me", user_id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/group_members"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(query_param("user_id", format!("eq.{user_id}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.server)
        .await;

    let client = app.anon();
    let session = client
        .auth()
        .sign_in_with_password(&Credentials::new("test55@andywong.me", "123456"))
        .await
        .unwrap();
    assert_eq!(session.user_id(), user_id);
    assert!(session.user.is_confirmed());

    let memberships = ckn_admin::repositories::GroupMemberRepository::memberships_for_user(
        &client.with_session(&session),
        user_id,
    )
    .await
    .unwrap();
    assert!(memberships.is_empty());
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&app.server)
        .await;

    let result = app
        .anon()
        .auth()
        .sign_in_with_password(&Credentials::new("test55@andywong.me", "wrong-password"))
        .await;
    match result {
        Err(AdminError::Unauthorized(message)) => {
            assert_eq!(message, "Invalid login credentials")
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected_locally() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let result = app
        .anon()
        .auth()
        .sign_in_with_password(&Credentials::new("not-an-email", "123456"))
        .await;
    assert!(matches!(result, Err(AdminError::Validation(_))));
}

#[tokio::test]
async fn test_admin_list_users_pages() {
    let app = TestApp::new().await;

    let full_page: Vec<_> = (0..50)
        .map(|i| json!({ "id": Uuid::new_v4(), "email": format!("user{i}@example.com") }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(header("authorization", format!("Bearer {SERVICE_KEY}").as_str()))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": full_page })))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "id": Uuid::new_v4(), "email": "New.User@Example.com" }]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let client = app.service();
    let users = client.auth().admin_list_users().await.unwrap();
    assert_eq!(users.len(), 51);
    assert!(users.iter().all(|u| !u.is_confirmed()));
}

#[tokio::test]
async fn test_rpc_empty_body_is_null() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/exec_sql"))
        .and(body_partial_json(json!({ "sql": "select 1" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;

    let value: serde_json::Value = app
        .service()
        .rpc("exec_sql", &json!({ "sql": "select 1" }))
        .await
        .unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn test_admin_list_users_stops_on_repeated_page() {
    let app = TestApp::new().await;

    // Same full page whatever `page` says
    let full_page: Vec<_> = (0..50)
        .map(|i| json!({ "id": Uuid::new_v4(), "email": format!("user{i}@example.com") }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": full_page })))
        .expect(2)
        .mount(&app.server)
        .await;

    let users = app.service().auth().admin_list_users().await.unwrap();
    assert_eq!(users.len(), 50);
}

#[tokio::test]
async fn test_delete_sends_filters_and_returns_rows() {
    let app = TestApp::new().await;
    let share_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/share_reactions"))
        .and(query_param("share_id", format!("eq.{share_id}").as_str()))
        .and(query_param("select", "id"))
        .and(header("prefer", "return=representation"))
        .and(header("authorization", format!("Bearer {SERVICE_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4() },
            { "id": Uuid::new_v4() }
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let deleted: Vec<serde_json::Value> = app
        .service()
        .from("share_reactions")
        .select("id")
        .eq("share_id", share_id)
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted.len(), 2);
}
