// ABOUTME: Backend configuration record naming the hosted project, database, and collection
// ABOUTME: Loadable from the TOML config or fetched as a JSON record from a URL

use crate::constants::backend::{DEFAULT_COLLECTION_ID, DEFAULT_ENDPOINT};
use crate::error::HookpadError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque constants that locate the session collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    #[serde(alias = "database_id")]
    pub database_id: String,
    #[serde(alias = "collection_id", default = "default_collection")]
    pub collection_id: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION_ID.to_string()
}

impl BackendConfig {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }

    /// Fetch the JSON config record (`endpoint`, `projectId`, `databaseId`,
    /// `collectionId`) from a URL.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, HookpadError> {
        let url = Url::parse(url)?;
        let response = client.get(url.as_str()).send().await?;

        if !response.status().is_success() {
            return Err(HookpadError::Http {
                status: response.status().as_u16(),
            });
        }

        let config: BackendConfig = response
            .json()
            .await
            .map_err(|e| HookpadError::InvalidResponse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HookpadError> {
        Url::parse(&self.endpoint).map_err(|e| {
            HookpadError::Configuration(format!("Invalid backend endpoint '{}': {}", self.endpoint, e))
        })?;

        for (name, value) in [
            ("project id", &self.project_id),
            ("database id", &self.database_id),
            ("collection id", &self.collection_id),
        ] {
            if value.trim().is_empty() {
                return Err(HookpadError::Configuration(format!("backend {} is empty", name)));
            }
        }

        Ok(())
    }

    /// Base URL of the document collection.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint.trim_end_matches('/'),
            self.database_id,
            self.collection_id
        )
    }

    pub fn document_url(&self, document_id: &str) -> String {
        format!("{}/{}", self.documents_url(), document_id)
    }

    pub fn account_url(&self, suffix: &str) -> String {
        format!("{}/account{}", self.endpoint.trim_end_matches('/'), suffix)
    }
}
