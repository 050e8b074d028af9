// ABOUTME: Centralized constants for the hookpad CLI application
// ABOUTME: Contains fixed user-facing messages, editor templates, limits, and timer intervals

/// Free-tier and history limits
pub mod limits {
    /// Messages an unregistered user may send before being asked to sign in
    pub const MAX_FREE_MESSAGES: u32 = 3;

    /// Maximum characters kept from a derived session title
    pub const TITLE_MAX_CHARS: usize = 40;

    /// Maximum object keys listed in the "unrecognized object" diagnostic
    pub const MAX_LISTED_KEYS: usize = 5;
}

/// Timer configurations for debounced work and UI feedback
pub mod timeouts {
    use std::time::Duration;

    /// Idle time before editor content is auto-saved
    pub const AUTO_SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

    /// Quiescence window for the window-resize fallback
    pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

    /// Progress spinner tick interval for smooth animation
    pub const PROGRESS_BAR_TICK_MS: u64 = 80;
}

/// Editor contents shown outside of a real prompt
pub mod editor {
    /// Placeholder shown before the first message; never persisted
    pub const PLACEHOLDER: &str = "// Your code will appear here\n// Send a message to get started";

    /// Template loaded when a new session is started
    pub const NEW_PROMPT: &str = "// New prompt\n// Add your JSON configuration here";
}

/// Fixed texts produced by the normalizer and the message flows
pub mod messages {
    pub const NO_RESPONSE_DATA: &str = "No response data received";
    pub const BINARY_TEXT: &str =
        "Received binary data (likely an image or file). Cannot display as text.";
    pub const IMAGE_TEXT: &str = "Received image data. Cannot display binary content as text.";
    pub const IMAGE_ERROR_PREFIX: &str = "Error displaying image: ";

    pub const CHAT_FALLBACK: &str =
        "// Sorry, I'm having trouble connecting to the server.\n// Please try again later.";
    pub const CONTENT_FALLBACK: &str = "Error: Unable to process content. Please try again.";
    pub const HINT_FAILED: &str = "Failed to load dynamic content";
    pub const HINT_CONNECTION_ERROR: &str = "Connection error";

    pub const QUOTA_EXCEEDED: &str =
        "You've used all free messages. Sign in (set HOOKPAD_SESSION) to keep chatting.";
}

/// Generated file naming
pub mod files {
    pub const IMAGE_PREFIX: &str = "generated-image";
    pub const DEFAULT_MIME: &str = "image/jpeg";
    pub const DEFAULT_EXTENSION: &str = "jpg";
    pub const STATE_DIR: &str = ".hookpad";
    pub const STATE_FILE: &str = "state.json";
    pub const PROJECT_CONFIG: &str = "hookpad.toml";
}

/// Terminal cell size estimates used to convert cells to pixels
pub mod terminal {
    pub const CELL_WIDTH_PX: f64 = 8.0;
    pub const CELL_HEIGHT_PX: f64 = 16.0;
}
