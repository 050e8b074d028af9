// ABOUTME: Custom error types for the hookpad SDK with user-friendly messages
// ABOUTME: Maps transport failures and backend error bodies onto a small taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookpadError {
    #[error("Authentication failed. Check HOOKPAD_API_KEY or sign in again")]
    Auth,

    #[error("Document {0} not found")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("Backend error ({code}): {message}")]
    Backend { code: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout: Request took too long to complete")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HookpadError {
    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            HookpadError::Auth => {
                Some("Set HOOKPAD_API_KEY, or HOOKPAD_SESSION for a signed-in user session")
            }
            HookpadError::NotFound(_) => Some("The session may have been deleted on the backend"),
            HookpadError::Network(_) => Some("Check your internet connection and try again"),
            HookpadError::Timeout => Some("Try again or raise the configured request timeout"),
            HookpadError::Configuration(_) => {
                Some("Check the [backend] and [webhooks] sections of your hookpad.toml")
            }
            _ => None,
        }
    }

    /// True for the "document does not exist" class of errors that lets an
    /// upsert fall back to create.
    pub fn is_not_found(&self) -> bool {
        match self {
            HookpadError::NotFound(_) | HookpadError::Http { status: 404 } => true,
            HookpadError::Backend { code, message } => {
                *code == 404 || message.contains("Document not found")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HookpadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HookpadError::Timeout
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => HookpadError::Auth,
                code => HookpadError::Http { status: code },
            }
        } else {
            HookpadError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HookpadError {
    fn from(err: serde_json::Error) -> Self {
        HookpadError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for HookpadError {
    fn from(err: url::ParseError) -> Self {
        HookpadError::Configuration(format!("Invalid URL: {}", err))
    }
}
