//! Content import against a mock backend

mod common;

use std::fs;

use ckn_admin::error::AdminError;
use ckn_admin::services::{ImportService, VerifyService};
use ckn_admin_shared::PayloadShape;
use common::TestApp;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn content_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("第1天 營養學基礎.md"),
        "# CKN\n### 營養學基礎\n營養素與健康",
    )
    .unwrap();
    fs::write(dir.path().join("第二天 早餐.md"), "### 早餐增加蛋白質\n雞蛋").unwrap();
    fs::write(dir.path().join("第3天.md"), "沒有標題的內容").unwrap();
    fs::write(dir.path().join("README.md"), "ignored").unwrap();
    dir
}

#[tokio::test]
async fn test_import_upserts_every_day() {
    let app = TestApp::new().await;
    let dir = content_dir();

    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .and(query_param("on_conflict", "day_number"))
        .and(body_partial_json(json!({ "day_number": 1, "title": "營養學基礎" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "day_number": 1 }])))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .and(body_partial_json(json!({ "day_number": 2, "title": "早餐增加蛋白質" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "day_number": 2 }])))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .and(body_partial_json(json!({ "day_number": 3, "title": "未命名" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "day_number": 3 }])))
        .expect(1)
        .mount(&app.server)
        .await;

    let summary = ImportService::import_content(&app.service(), dir.path(), 21)
        .await
        .unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.imported, vec![1, 2, 3]);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn test_import_skips_failed_day() {
    let app = TestApp::new().await;
    let dir = content_dir();

    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .and(body_partial_json(json!({ "day_number": 2 })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_content"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let summary = ImportService::import_content(&app.service(), dir.path(), 21)
        .await
        .unwrap();
    assert_eq!(summary.imported, vec![1, 3]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, 2);
}

#[tokio::test]
async fn test_import_missing_directory() {
    let app = TestApp::new().await;
    let dir = tempfile::tempdir().unwrap();

    let result =
        ImportService::import_content(&app.service(), &dir.path().join("missing"), 21).await;
    assert!(matches!(result, Err(AdminError::NotFound(_))));
}

#[tokio::test]
async fn test_verify_reports_gaps() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/daily_content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "day_number": 1, "title": "a" },
            { "day_number": 2, "title": "b" },
            { "day_number": 3, "title": "c" }
        ])))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "day_number": 1, "questions": common::quiz_json() },
            // Older rows stored the payload as a JSON string
            { "day_number": 3, "questions": common::quiz_json().to_string() }
        ])))
        .mount(&app.server)
        .await;

    let report = VerifyService::verify(&app.service(), 3).await.unwrap();
    assert!(report.missing_content.is_empty());
    assert_eq!(report.missing_quizzes, vec![2]);
    assert_eq!(report.total_questions, 6);
    assert!(!report.is_ready());
}

#[tokio::test]
async fn test_verify_lists_unreadable_quizzes() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/daily_content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "day_number": 1, "title": "a" },
            { "day_number": 2, "title": "b" },
            { "day_number": 3, "title": "c" }
        ])))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "day_number": 1, "questions": common::quiz_json() },
            { "day_number": 2, "questions": [{
                "question": "Q?",
                "options": ["A. 1", "B. 2", "C. 3", "D. 4"],
                "correct_answer": "正確答案：B"
            }] },
            { "day_number": 3, "questions": null }
        ])))
        .mount(&app.server)
        .await;

    let report = VerifyService::verify(&app.service(), 3).await.unwrap();
    assert_eq!(report.quiz_days, vec![1, 2, 3]);
    assert!(report.missing_quizzes.is_empty());
    assert_eq!(report.unreadable_quizzes, vec![2, 3]);
    assert_eq!(report.total_questions, 3);
    assert!(!report.is_ready());
}

#[tokio::test]
async fn test_verify_checks_quizzes_when_content_fails() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/daily_content"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "day_number": 1, "questions": common::quiz_json() }
        ])))
        .mount(&app.server)
        .await;

    let report = VerifyService::verify(&app.service(), 1).await.unwrap();
    assert_eq!(report.failed_sections.len(), 1);
    assert_eq!(report.failed_sections[0].0, "daily_content");
    assert_eq!(report.quiz_days, vec![1]);
    assert_eq!(report.total_questions, 3);
    assert!(!report.is_ready());
}

#[tokio::test]
async fn test_inspect_quiz_reports_stored_shape() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .and(query_param("day_number", "eq.6"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "5b0f4b5e-3a57-4c59-9d47-0d8f1d3b7a11",
            "day_number": 6,
            "created_at": "2025-10-06T00:00:00+00:00",
            "questions": json!([{
                "question": "Q?",
                "options": { "A": "1", "B": "2", "C": "3", "D": "4" },
                "correct_answer": "C"
            }]).to_string()
        }])))
        .mount(&app.server)
        .await;

    let row = VerifyService::inspect_quiz(&app.service(), 6).await.unwrap();
    assert_eq!(row.id_label(), "5b0f4b5e-3a57-4c59-9d47-0d8f1d3b7a11");
    assert_eq!(row.shape(), PayloadShape::Encoded);
    assert!(row.has_keyed_options());
    assert_eq!(row.parse().unwrap().questions[0].correct_option(), Some("C. 3"));
}

#[tokio::test]
async fn test_inspect_quiz_missing_day() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;

    let result = VerifyService::inspect_quiz(&app.service(), 9).await;
    assert!(matches!(result, Err(AdminError::NotFound(_))));
}
