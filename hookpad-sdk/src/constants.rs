// ABOUTME: Centralized constants for the hookpad SDK
// ABOUTME: Contains backend URLs, header names, query limits, and content-type labels

/// HTTP and request settings
pub mod http {
    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("hookpad/", env!("CARGO_PKG_VERSION"));
}

/// Appwrite-style backend URLs and headers
pub mod backend {
    /// Default hosted endpoint
    pub const DEFAULT_ENDPOINT: &str = "https://nyc.cloud.appwrite.io/v1";

    /// Collection that stores editor sessions
    pub const DEFAULT_COLLECTION_ID: &str = "chat_sessions";

    pub const PROJECT_HEADER: &str = "X-Appwrite-Project";
    pub const KEY_HEADER: &str = "X-Appwrite-Key";
    pub const SESSION_HEADER: &str = "X-Appwrite-Session";

    /// Error type string the backend returns for a missing document
    pub const DOCUMENT_NOT_FOUND: &str = "document_not_found";
}

/// Session history queries
pub mod history {
    /// Number of sessions returned by a history listing
    pub const HISTORY_LIMIT: u32 = 20;

    /// Field the history is filtered by
    pub const USER_FIELD: &str = "user_id";

    /// Field the history is ordered by (descending)
    pub const ORDER_FIELD: &str = "updated_at";
}

/// Content-type labels that pick the response decoding path
pub mod content_types {
    pub const JSON: &str = "application/json";
    pub const IMAGE_PREFIX: &str = "image/";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
