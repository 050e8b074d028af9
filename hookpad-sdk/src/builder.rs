// ABOUTME: Builder pattern implementation for HookpadClient configuration
// ABOUTME: Provides typed configuration with secrets kept behind secrecy wrappers

use crate::error::HookpadError;
use crate::{BackendConfig, HookpadClient};
use secrecy::SecretString;
use std::time::Duration;
use typed_builder::TypedBuilder;
use url::Url;

#[derive(Debug, TypedBuilder)]
#[builder(build_method(into = Result<HookpadClient, HookpadError>))]
pub struct HookpadClientConfig {
    #[builder(default = None)]
    pub backend: Option<BackendConfig>,

    #[builder(default = None)]
    pub api_key: Option<SecretString>,

    #[builder(default = None)]
    pub session_secret: Option<SecretString>,

    #[builder(default = false)]
    pub verbose: bool,

    /// Unset by default: requests wait for the remote side indefinitely.
    #[builder(default = None)]
    pub timeout: Option<Duration>,

    #[builder(default = None)]
    pub proxy: Option<reqwest::Proxy>,
}

impl From<HookpadClientConfig> for Result<HookpadClient, HookpadError> {
    fn from(config: HookpadClientConfig) -> Self {
        HookpadClient::from_config(config)
    }
}

impl HookpadClient {
    pub fn builder() -> HookpadClientConfigBuilder<((), (), (), (), (), ())> {
        HookpadClientConfig::builder()
    }
}

// Helper to create proxy from URL
impl HookpadClient {
    pub fn create_proxy(url: &str) -> Result<reqwest::Proxy, HookpadError> {
        let parsed_url = Url::parse(url)
            .map_err(|e| HookpadError::Configuration(format!("Invalid proxy URL: {}", e)))?;

        reqwest::Proxy::all(parsed_url.as_str()).map_err(|e| {
            HookpadError::Configuration(format!("Invalid proxy configuration: {}", e))
        })
    }
}
