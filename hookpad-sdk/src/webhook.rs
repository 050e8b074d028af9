// ABOUTME: Pass-through client for arbitrary webhook endpoints
// ABOUTME: Posts prompt messages as JSON and decodes the reply by its content type

use crate::error::HookpadError;
use crate::payload::{Payload, WebhookResponse};
use crate::{HookpadClient, Result};
use log::debug;
use serde::Serialize;
use url::Url;

/// Body posted to every webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl WebhookRequest {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

impl HookpadClient {
    /// POST a request to a webhook. Failures propagate to the caller and are
    /// never retried.
    pub async fn send_webhook(&self, url: &str, request: &WebhookRequest) -> Result<WebhookResponse> {
        let url = Url::parse(url)?;

        let response = self
            .client
            .post(url.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HookpadError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;

        debug!(
            "webhook {} replied with {} bytes ({})",
            url,
            body.len(),
            content_type.as_deref().unwrap_or("no content-type")
        );

        let payload = Payload::decode(&body, content_type.as_deref())?;

        Ok(WebhookResponse {
            payload,
            content_type,
        })
    }
}
