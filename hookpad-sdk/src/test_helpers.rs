// ABOUTME: Test helper utilities for mocking webhook and backend responses
// ABOUTME: Provides mockito-based helpers for unit testing HTTP interactions

#[cfg(test)]
use crate::{BackendConfig, HookpadClient};
#[cfg(test)]
use mockito::{Server, ServerGuard};
#[cfg(test)]
use secrecy::SecretString;
#[cfg(test)]
use serde_json::json;

#[cfg(test)]
pub async fn mock_backend_server() -> ServerGuard {
    Server::new_async().await
}

/// Client pointed at a mock server, with database `db` and collection `sessions`.
#[cfg(test)]
pub fn test_client(server_url: &str) -> HookpadClient {
    HookpadClient::builder()
        .backend(Some(BackendConfig::new(
            server_url,
            "test-project",
            "db",
            "sessions",
        )))
        .api_key(Some(SecretString::new(
            "test-key".to_string().into_boxed_str(),
        )))
        .build()
        .unwrap()
}

#[cfg(test)]
pub fn mock_user_response() -> serde_json::Value {
    json!({
        "$id": "user-1",
        "name": "Test User",
        "email": "test@example.com",
        "status": true
    })
}

#[cfg(test)]
pub fn mock_session_document(session_id: &str, title: &str) -> serde_json::Value {
    json!({
        "$id": session_id,
        "$collectionId": "sessions",
        "$databaseId": "db",
        "user_id": "user-1",
        "session_id": session_id,
        "editor_content": format!("// {}\n{{}}", title),
        "session_title": title,
        "updated_at": "2024-01-16T14:45:00Z"
    })
}

#[cfg(test)]
pub fn mock_session_list_response() -> serde_json::Value {
    json!({
        "total": 2,
        "documents": [
            mock_session_document("session_2", "Second prompt"),
            mock_session_document("session_1", "First prompt")
        ]
    })
}

#[cfg(test)]
pub fn mock_not_found_response() -> serde_json::Value {
    json!({
        "message": "Document with the requested ID could not be found.",
        "code": 404,
        "type": "document_not_found",
        "version": "1.5.7"
    })
}

#[cfg(test)]
pub fn mock_unauthorized_response() -> serde_json::Value {
    json!({
        "message": "The current user is not authorized to perform the requested action.",
        "code": 401,
        "type": "user_unauthorized",
        "version": "1.5.7"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_responses_are_well_formed() {
        assert_eq!(mock_user_response()["$id"], "user-1");
        assert_eq!(
            mock_session_list_response()["documents"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(mock_not_found_response()["code"], 404);
        assert_eq!(mock_unauthorized_response()["code"], 401);
    }
}
