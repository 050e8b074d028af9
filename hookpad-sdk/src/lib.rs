// ABOUTME: hookpad SDK providing clients for webhook endpoints and the hosted session store
// ABOUTME: Includes the backend configuration record, typed errors, and keychain storage

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};

pub mod account;
pub mod backend;
pub mod builder;
pub mod constants;
pub mod error;
pub mod payload;
pub mod storage;
pub mod store;
pub mod webhook;

#[cfg(test)]
mod test_helpers;

pub use account::User;
pub use backend::BackendConfig;
pub use builder::HookpadClientConfig;
pub use error::HookpadError;
pub use payload::{DecodePath, Payload, WebhookResponse};
pub use store::{Query, SessionRecord, SessionStore};
pub use webhook::WebhookRequest;

pub type Result<T> = std::result::Result<T, HookpadError>;

/// HTTP client shared by the webhook, document store, and account calls.
pub struct HookpadClient {
    client: reqwest::Client,
    backend: Option<BackendConfig>,
    api_key: Option<SecretString>,
    session_secret: Option<SecretString>,
    verbose: bool,
}

impl HookpadClient {
    pub fn from_config(config: HookpadClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(constants::http::USER_AGENT),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);

        // No timeout unless one is configured; a hung webhook stalls its caller.
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy) = config.proxy {
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| HookpadError::Configuration(format!("HTTP client: {}", e)))?;

        if let Some(backend) = &config.backend {
            backend.validate()?;
        }

        Ok(Self {
            client,
            backend: config.backend,
            api_key: config.api_key,
            session_secret: config.session_secret,
            verbose: config.verbose,
        })
    }

    pub fn backend(&self) -> Option<&BackendConfig> {
        self.backend.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session_secret.is_some()
    }

    fn require_backend(&self) -> Result<&BackendConfig> {
        self.backend.as_ref().ok_or_else(|| {
            HookpadError::Configuration("no backend endpoint configured".to_string())
        })
    }

    /// Start a request against the backend with project and credential headers.
    fn backend_request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::RequestBuilder> {
        let backend = self.require_backend()?;

        let mut request = self
            .client
            .request(method, url)
            .header(constants::backend::PROJECT_HEADER, &backend.project_id)
            .header(CONTENT_TYPE, "application/json");

        if let Some(key) = &self.api_key {
            request = request.header(constants::backend::KEY_HEADER, key.expose_secret());
        }
        if let Some(session) = &self.session_secret {
            request = request.header(
                constants::backend::SESSION_HEADER,
                session.expose_secret(),
            );
        }

        if self.verbose {
            debug!("backend request: {}", url);
        }

        Ok(request)
    }
}
