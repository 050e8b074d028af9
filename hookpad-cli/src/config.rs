// ABOUTME: Configuration file loading, validation, and hierarchical merging for hookpad
// ABOUTME: Supports TOML config files with XDG Base Directory specification compliance

use crate::constants::files::PROJECT_CONFIG;
use crate::fitting::FitConfig;
use anyhow::{anyhow, Context, Result};
use hookpad_sdk::BackendConfig;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the backend API key
pub const API_KEY_ENV: &str = "HOOKPAD_API_KEY";

/// Environment variable holding the signed-in user's session secret
pub const SESSION_ENV: &str = "HOOKPAD_SESSION";

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: Option<BackendSection>,
    #[serde(default)]
    pub webhooks: Option<WebhookSection>,
    #[serde(default)]
    pub fit: Option<FitOverrides>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct BackendSection {
    #[serde(default, deserialize_with = "validate_url")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    /// URL of a JSON backend record, used when the ids are not set inline
    #[serde(default, deserialize_with = "validate_url")]
    pub config_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct WebhookSection {
    #[serde(default, deserialize_with = "validate_url")]
    pub chat: Option<String>,
    #[serde(default, deserialize_with = "validate_url")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "validate_url")]
    pub summary: Option<String>,
}

/// Partial overrides of the image fitting thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct FitOverrides {
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub container_padding: Option<f64>,
    pub quality: Option<f64>,
    pub maintain_aspect_ratio: Option<bool>,
    pub enable_responsive_scaling: Option<bool>,
}

impl Config {
    /// Load configuration from standard XDG-compliant locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        let lowest_first: Vec<&str> = paths.iter().rev().map(|p| p.as_str()).collect();
        Self::load_from_paths(&lowest_first)
    }

    /// Load configuration from specific file paths. Later paths override
    /// earlier ones; missing files are skipped.
    pub fn load_from_paths(paths: &[&str]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            if !Path::new(path).exists() {
                continue;
            }
            let file_config = Self::load_from_file(path)?;
            config = config.merge(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get standard config file paths in order of precedence (highest first)
    pub fn get_config_paths() -> Vec<String> {
        let mut paths = Vec::new();

        // 1. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(
                current_dir
                    .join(PROJECT_CONFIG)
                    .to_string_lossy()
                    .to_string(),
            );
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(config_home)
                .join("hookpad")
                .join("config.toml");
            paths.push(path.to_string_lossy().to_string());
        }

        // 3. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            let path = home_dir.join(".config").join("hookpad").join("config.toml");
            paths.push(path.to_string_lossy().to_string());
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            backend: merge_sections(self.backend, other.backend, BackendSection::merge),
            webhooks: merge_sections(self.webhooks, other.webhooks, WebhookSection::merge),
            fit: merge_sections(self.fit, other.fit, FitOverrides::merge),
            output_dir: other.output_dir.or(self.output_dir),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref fit) = self.fit {
            fit.validate().context("Invalid [fit] configuration")?;
        }
        Ok(())
    }

    /// Backend record from the inline `[backend]` ids. `None` when the
    /// project or database id is missing.
    pub fn backend_config(&self) -> Option<BackendConfig> {
        let backend = self.backend.as_ref()?;
        let project_id = backend.project_id.clone()?;
        let database_id = backend.database_id.clone()?;

        let mut record = BackendConfig::new(
            hookpad_sdk::constants::backend::DEFAULT_ENDPOINT,
            project_id,
            database_id,
            hookpad_sdk::constants::backend::DEFAULT_COLLECTION_ID,
        );
        if let Some(endpoint) = &backend.endpoint {
            record.endpoint = endpoint.clone();
        }
        if let Some(collection_id) = &backend.collection_id {
            record.collection_id = collection_id.clone();
        }
        Some(record)
    }

    pub fn backend_config_url(&self) -> Option<&str> {
        self.backend.as_ref()?.config_url.as_deref()
    }

    pub fn webhook(&self, kind: WebhookKind) -> Option<&str> {
        let webhooks = self.webhooks.as_ref()?;
        match kind {
            WebhookKind::Chat => webhooks.chat.as_deref(),
            WebhookKind::Image => webhooks.image.as_deref(),
            WebhookKind::Summary => webhooks.summary.as_deref(),
        }
    }

    pub fn require_webhook(&self, kind: WebhookKind) -> Result<&str> {
        self.webhook(kind).ok_or_else(|| {
            anyhow!(
                "No {} webhook configured. Set webhooks.{} in {}",
                kind.key(),
                kind.key(),
                PROJECT_CONFIG
            )
        })
    }

    /// Default fit thresholds with any `[fit]` overrides applied.
    pub fn fit_config(&self) -> FitConfig {
        let mut config = FitConfig::default();
        if let Some(ref fit) = self.fit {
            fit.apply(&mut config);
        }
        config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Chat,
    Image,
    Summary,
}

impl WebhookKind {
    pub fn key(&self) -> &'static str {
        match self {
            WebhookKind::Chat => "chat",
            WebhookKind::Image => "image",
            WebhookKind::Summary => "summary",
        }
    }
}

fn merge_sections<T>(base: Option<T>, other: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (base, other) {
        (Some(base), Some(other)) => Some(merge(base, other)),
        (Some(base), None) => Some(base),
        (None, other) => other,
    }
}

impl BackendSection {
    pub fn merge(self, other: BackendSection) -> BackendSection {
        BackendSection {
            endpoint: other.endpoint.or(self.endpoint),
            project_id: other.project_id.or(self.project_id),
            database_id: other.database_id.or(self.database_id),
            collection_id: other.collection_id.or(self.collection_id),
            config_url: other.config_url.or(self.config_url),
        }
    }
}

impl WebhookSection {
    pub fn merge(self, other: WebhookSection) -> WebhookSection {
        WebhookSection {
            chat: other.chat.or(self.chat),
            image: other.image.or(self.image),
            summary: other.summary.or(self.summary),
        }
    }
}

impl FitOverrides {
    pub fn merge(self, other: FitOverrides) -> FitOverrides {
        FitOverrides {
            max_width: other.max_width.or(self.max_width),
            max_height: other.max_height.or(self.max_height),
            min_width: other.min_width.or(self.min_width),
            min_height: other.min_height.or(self.min_height),
            container_padding: other.container_padding.or(self.container_padding),
            quality: other.quality.or(self.quality),
            maintain_aspect_ratio: other.maintain_aspect_ratio.or(self.maintain_aspect_ratio),
            enable_responsive_scaling: other
                .enable_responsive_scaling
                .or(self.enable_responsive_scaling),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("max_width", self.max_width),
            ("max_height", self.max_height),
            ("min_width", self.min_width),
            ("min_height", self.min_height),
            ("container_padding", self.container_padding),
        ];
        for (name, value) in sizes {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(anyhow!("{} must be a non-negative number, got {}", name, value));
                }
            }
        }

        if let Some(quality) = self.quality {
            if !(0.0..=1.0).contains(&quality) {
                return Err(anyhow!("quality must be between 0 and 1, got {}", quality));
            }
        }

        Ok(())
    }

    pub fn apply(&self, config: &mut FitConfig) {
        if let Some(v) = self.max_width {
            config.max_width = v;
        }
        if let Some(v) = self.max_height {
            config.max_height = v;
        }
        if let Some(v) = self.min_width {
            config.min_width = v;
        }
        if let Some(v) = self.min_height {
            config.min_height = v;
        }
        if let Some(v) = self.container_padding {
            config.container_padding = v;
        }
        if let Some(v) = self.quality {
            config.quality = v;
        }
        if let Some(v) = self.maintain_aspect_ratio {
            config.maintain_aspect_ratio = v;
        }
        if let Some(v) = self.enable_responsive_scaling {
            config.enable_responsive_scaling = v;
        }
    }
}

/// Backend API key from the environment. Secrets are never read from files.
pub fn api_key() -> Option<SecretString> {
    non_empty_env(API_KEY_ENV).map(SecretString::from)
}

/// Session secret from the environment, falling back to the keychain.
pub fn session_secret() -> Option<SecretString> {
    if let Some(secret) = non_empty_env(SESSION_ENV) {
        return Some(SecretString::from(secret));
    }

    match hookpad_sdk::storage::load() {
        Ok(secret) if !secret.is_empty() => Some(SecretString::from(secret)),
        Ok(_) => None,
        Err(e) => {
            log::debug!("No stored session secret: {}", e);
            None
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Custom deserializer for URL validation
fn validate_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;

    if let Some(ref url) = value {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(value),
            Ok(parsed) => Err(D::Error::custom(format!(
                "Invalid URL '{}': scheme must be http or https, got {}",
                url,
                parsed.scheme()
            ))),
            Err(e) => Err(D::Error::custom(format!("Invalid URL '{}': {}", url, e))),
        }
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.backend.is_none());
        assert!(config.webhooks.is_none());
        assert_eq!(config.fit_config(), FitConfig::default());
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            webhooks: Some(WebhookSection {
                chat: Some("https://base.example.com/chat".to_string()),
                image: Some("https://base.example.com/image".to_string()),
                summary: None,
            }),
            output_dir: Some(PathBuf::from("/tmp/base")),
            ..Default::default()
        };

        let override_config = Config {
            webhooks: Some(WebhookSection {
                chat: Some("https://override.example.com/chat".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(
            merged.webhook(WebhookKind::Chat),
            Some("https://override.example.com/chat")
        );
        assert_eq!(
            merged.webhook(WebhookKind::Image),
            Some("https://base.example.com/image")
        );
        assert_eq!(merged.webhook(WebhookKind::Summary), None);
        assert_eq!(merged.output_dir(), PathBuf::from("/tmp/base"));
    }

    #[test]
    fn test_backend_config_requires_ids() {
        let config = Config {
            backend: Some(BackendSection {
                project_id: Some("proj".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.backend_config().is_none());

        let config = Config {
            backend: Some(BackendSection {
                project_id: Some("proj".to_string()),
                database_id: Some("db".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let backend = config.backend_config().unwrap();
        assert_eq!(backend.project_id, "proj");
        assert_eq!(backend.collection_id, "chat_sessions");
        assert!(backend.endpoint.starts_with("https://"));
    }

    #[test]
    fn test_fit_overrides_apply() {
        let config = Config {
            fit: Some(FitOverrides {
                max_width: Some(1024.0),
                maintain_aspect_ratio: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let fit = config.fit_config();
        assert_eq!(fit.max_width, 1024.0);
        assert_eq!(fit.max_height, 600.0);
        assert!(!fit.maintain_aspect_ratio);
    }

    #[test]
    fn test_require_webhook_error_names_key() {
        let err = Config::default()
            .require_webhook(WebhookKind::Summary)
            .unwrap_err();
        assert!(err.to_string().contains("webhooks.summary"));
    }
}
