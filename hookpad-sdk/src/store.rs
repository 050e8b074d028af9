// ABOUTME: Document store client for persisted editor sessions
// ABOUTME: Implements update-then-create upserts and the per-user history query

use crate::constants::{backend, history};
use crate::error::HookpadError;
use crate::{HookpadClient, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A persisted editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub session_id: String,
    pub editor_content: String,
    #[serde(default)]
    pub session_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Query operators understood by the document listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<String> },
    OrderDesc(String),
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: &str, value: &str) -> Self {
        Query::Equal {
            attribute: attribute.to_string(),
            values: vec![value.to_string()],
        }
    }

    /// Serialized form sent as a `queries[]` parameter.
    pub fn to_param(&self) -> String {
        let value = match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::OrderDesc(attribute) => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(limit) => json!({
                "method": "limit",
                "values": [limit],
            }),
        };
        value.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    #[serde(default)]
    documents: Vec<T>,
}

/// Persistence seam used by the host so session logic can run without a server.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Update the session document, creating it when it does not exist yet.
    async fn upsert_session(&self, record: &SessionRecord) -> Result<()>;

    /// Most recently updated sessions for a user, newest first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>>;
}

impl HookpadClient {
    pub async fn update_document(&self, document_id: &str, data: &Value) -> Result<Value> {
        let url = self.require_backend()?.document_url(document_id);
        let response = self
            .backend_request(reqwest::Method::PATCH, &url)?
            .json(&json!({ "data": data }))
            .send()
            .await?;

        parse_response(response, document_id).await
    }

    pub async fn create_document(&self, document_id: &str, data: &Value) -> Result<Value> {
        let url = self.require_backend()?.documents_url();
        let response = self
            .backend_request(reqwest::Method::POST, &url)?
            .json(&json!({ "documentId": document_id, "data": data }))
            .send()
            .await?;

        parse_response(response, document_id).await
    }

    pub async fn list_documents(&self, queries: &[Query]) -> Result<Vec<Value>> {
        let url = self.require_backend()?.documents_url();
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_param()))
            .collect();

        let response = self
            .backend_request(reqwest::Method::GET, &url)?
            .query(&params)
            .send()
            .await?;

        let body = parse_response(response, "documents").await?;
        let list: DocumentList<Value> = serde_json::from_value(body)?;
        Ok(list.documents)
    }
}

#[async_trait]
impl SessionStore for HookpadClient {
    async fn upsert_session(&self, record: &SessionRecord) -> Result<()> {
        let data = serde_json::to_value(record)?;

        match self.update_document(&record.session_id, &data).await {
            Ok(_) => {
                debug!("Session updated: {}", record.session_id);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(
                    "Update failed ({}), creating session {}",
                    err, record.session_id
                );
                let mut created = data;
                if let Value::Object(map) = &mut created {
                    let stamp = record
                        .created_at
                        .clone()
                        .or_else(|| record.updated_at.clone());
                    map.insert("created_at".to_string(), json!(stamp));
                }
                self.create_document(&record.session_id, &created).await?;
                debug!("Session created: {}", record.session_id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let queries = [
            Query::equal(history::USER_FIELD, user_id),
            Query::OrderDesc(history::ORDER_FIELD.to_string()),
            Query::Limit(history::HISTORY_LIMIT),
        ];

        let documents = self.list_documents(&queries).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(HookpadError::from))
            .collect()
    }
}

/// Turn a backend response into its JSON body or a classified error.
pub(crate) async fn parse_response(response: reqwest::Response, what: &str) -> Result<Value> {
    let status = response.status();

    if status.is_success() {
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let code = status.as_u16();
    let body: Option<ErrorBody> = response.json().await.ok();
    let (message, kind) = body
        .map(|b| (b.message, b.kind))
        .unwrap_or_default();

    Err(match code {
        401 | 403 => HookpadError::Auth,
        404 => HookpadError::NotFound(what.to_string()),
        _ if kind == backend::DOCUMENT_NOT_FOUND => HookpadError::NotFound(what.to_string()),
        _ if message.is_empty() => HookpadError::Http { status: code },
        _ => HookpadError::Backend { code, message },
    })
}
