// ABOUTME: Integration tests for session persistence on disk and against a mock backend
// ABOUTME: Covers state file round-trips, the free-message quota, upsert fallback, and history

use chrono::{TimeZone, Utc};
use hookpad_cli::constants::editor;
use hookpad_cli::session::{
    load_history, save_session, AppContext, HistoryEntry, SaveOutcome, StateFile,
};
use hookpad_sdk::{BackendConfig, HookpadClient, User};
use mockito::Matcher;
use serde_json::json;
use tempfile::TempDir;

const DOCUMENTS_PATH: &str = "/databases/db/collections/chat_sessions/documents";

fn user() -> User {
    User {
        id: "user-1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    }
}

fn backend_client(url: &str) -> HookpadClient {
    HookpadClient::builder()
        .backend(Some(BackendConfig::new(url, "proj", "db", "chat_sessions")))
        .build()
        .unwrap()
}

#[test]
fn test_state_survives_restore() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("state.json");

    let mut ctx = AppContext::restore(StateFile::new(&path)).unwrap();
    assert_eq!(ctx.editor_content(), editor::PLACEHOLDER);
    assert_eq!(ctx.message_count(), 0);

    ctx.set_editor_content("{\"title\": \"Signup form\"}");
    ctx.record_message();
    ctx.record_message();
    ctx.persist().unwrap();
    let session_id = ctx.session_id().clone();

    let restored = AppContext::restore(StateFile::new(&path)).unwrap();
    assert_eq!(restored.session_id(), &session_id);
    assert_eq!(restored.editor_content(), "{\"title\": \"Signup form\"}");
    assert_eq!(restored.message_count(), 2);
}

#[test]
fn test_corrupt_state_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = AppContext::restore(StateFile::new(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse state file"));
}

#[test]
fn test_quota_persists_until_sign_out() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");

    let mut ctx = AppContext::restore(StateFile::new(&path)).unwrap();
    for _ in 0..3 {
        ctx.check_quota().unwrap();
        ctx.record_message();
    }
    ctx.persist().unwrap();

    let mut ctx = AppContext::restore(StateFile::new(&path)).unwrap();
    assert!(ctx.quota_reached());
    assert!(ctx.check_quota().is_err());

    ctx.set_user(Some(user()));
    assert!(!ctx.quota_reached());

    ctx.sign_out();
    assert_eq!(ctx.message_count(), 0);
    assert!(!ctx.quota_reached());
}

#[tokio::test]
async fn test_save_creates_missing_document() {
    let mut server = mockito::Server::new_async().await;
    let mut ctx = AppContext::new();
    ctx.set_user(Some(user()));
    ctx.set_editor_content("// Checkout page\nconst total = 0;");
    let document = format!("{}/{}", DOCUMENTS_PATH, ctx.session_id());

    let update = server
        .mock("PATCH", document.as_str())
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Document not found","code":404,"type":"document_not_found"}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", DOCUMENTS_PATH)
        .match_body(Matcher::PartialJson(json!({
            "documentId": ctx.session_id().as_str(),
            "data": {
                "user_id": "user-1",
                "session_title": "Checkout page"
            }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"$id":"created"}"#)
        .create_async()
        .await;

    let client = backend_client(&server.url());
    assert_eq!(save_session(&ctx, &client).await, SaveOutcome::Saved);

    update.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_save_skips_placeholder_and_signed_out() {
    let server = mockito::Server::new_async().await;
    let client = backend_client(&server.url());

    let mut ctx = AppContext::new();
    ctx.set_editor_content("const a = 1;");
    assert_eq!(save_session(&ctx, &client).await, SaveOutcome::Skipped);

    ctx.set_user(Some(user()));
    ctx.set_editor_content(format!("  {}  ", editor::PLACEHOLDER));
    assert_eq!(save_session(&ctx, &client).await, SaveOutcome::Skipped);
}

#[tokio::test]
async fn test_save_failure_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _update = server
        .mock("PATCH", Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let mut ctx = AppContext::new();
    ctx.set_user(Some(user()));
    ctx.set_editor_content("const a = 1;");

    let client = backend_client(&server.url());
    assert_eq!(save_session(&ctx, &client).await, SaveOutcome::Failed);
}

#[tokio::test]
async fn test_history_marks_current_session() {
    let mut server = mockito::Server::new_async().await;
    let mut ctx = AppContext::new();
    ctx.set_user(Some(user()));
    let current = ctx.session_id().to_string();

    let _list = server
        .mock("GET", DOCUMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "total": 2,
                "documents": [
                    {
                        "user_id": "user-1",
                        "session_id": current,
                        "editor_content": "{}",
                        "session_title": "Current prompt",
                        "updated_at": "2024-05-02T10:00:00.000Z"
                    },
                    {
                        "user_id": "user-1",
                        "session_id": "session_1_old",
                        "editor_content": "x",
                        "session_title": "",
                        "updated_at": "not a date"
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = backend_client(&server.url());
    let records = load_history(&ctx, &client).await;
    assert_eq!(records.len(), 2);

    let entries: Vec<HistoryEntry> = records
        .iter()
        .map(|record| HistoryEntry::from_record(record, ctx.session_id()))
        .collect();
    assert!(entries[0].active);
    assert_eq!(entries[0].title, "Current prompt");
    assert!(!entries[1].active);
    assert_eq!(entries[1].title, "Untitled Prompt");
    assert_eq!(entries[1].date, "Invalid Date");
}

#[tokio::test]
async fn test_history_is_empty_on_backend_error() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let mut ctx = AppContext::new();
    ctx.set_user(Some(user()));
    let client = backend_client(&server.url());
    assert!(load_history(&ctx, &client).await.is_empty());
}

#[test]
fn test_session_record_timestamp() {
    let mut ctx = AppContext::new();
    ctx.set_user(Some(user()));
    ctx.set_editor_content("[\"Hero banner\"]");

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    let record = ctx.session_record(now).unwrap();
    assert_eq!(record.updated_at.as_deref(), Some("2024-05-01T12:30:00.000Z"));
    assert_eq!(record.session_title.as_deref(), Some("Hero banner"));
    assert_eq!(record.user_id, "user-1");
}
