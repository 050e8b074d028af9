// ABOUTME: Identity provider calls for the signed-in user
// ABOUTME: Fetches the current user object and deletes the current session on sign-out

use crate::store::parse_response;
use crate::{HookpadClient, Result};
use serde::{Deserialize, Serialize};

/// Opaque user object returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    /// Name to show for the user: the display name, or the email when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    /// Single-letter avatar initial.
    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

impl HookpadClient {
    pub async fn current_user(&self) -> Result<User> {
        let url = self.require_backend()?.account_url("");
        let response = self
            .backend_request(reqwest::Method::GET, &url)?
            .send()
            .await?;

        let body = parse_response(response, "account").await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn sign_out(&self) -> Result<()> {
        let url = self.require_backend()?.account_url("/sessions/current");
        let response = self
            .backend_request(reqwest::Method::DELETE, &url)?
            .send()
            .await?;

        parse_response(response, "session").await?;
        Ok(())
    }
}
