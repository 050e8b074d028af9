// ABOUTME: Application context holding the signed-in user, current session, and editor content
// ABOUTME: Provides the free-message quota, session titles, history loading, and debounced auto-save

use crate::constants::{editor, files, limits, messages, timeouts};
use crate::debounce::Debouncer;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use hookpad_sdk::{SessionRecord, SessionStore, User};
use log::{debug, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//\s*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/\*\s*").unwrap());

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SESSION_SUFFIX_LEN: usize = 9;

/// Identifier of one editor session, `session_<millis>_<9 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self::generate_with(Utc::now().timestamp_millis(), &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(millis: i64, rng: &mut R) -> Self {
        let suffix: String = (0..SESSION_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("session_{}_{}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What survives between invocations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub session_id: Option<SessionId>,
    pub editor_content: Option<String>,
    pub message_count: u32,
}

/// JSON state file, `~/.hookpad/state.json` unless overridden.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(Self::new(home.join(files::STATE_DIR).join(files::STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SessionState> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))
    }

    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))
    }
}

/// Mutable state every flow operates on. Passed explicitly; there is no
/// global instance.
#[derive(Debug)]
pub struct AppContext {
    user: Option<User>,
    session_id: SessionId,
    editor_content: String,
    message_count: u32,
    state_file: Option<StateFile>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    /// Fresh in-memory context showing the placeholder editor.
    pub fn new() -> Self {
        Self {
            user: None,
            session_id: SessionId::generate(),
            editor_content: editor::PLACEHOLDER.to_string(),
            message_count: 0,
            state_file: None,
        }
    }

    /// Restore a context from `file`, falling back to a fresh session for
    /// anything the file does not hold.
    pub fn restore(file: StateFile) -> Result<Self> {
        let state = file.load()?;
        let mut ctx = Self::new();
        if let Some(id) = state.session_id {
            ctx.session_id = id;
        }
        if let Some(content) = state.editor_content {
            ctx.editor_content = content;
        }
        ctx.message_count = state.message_count;
        ctx.state_file = Some(file);
        Ok(ctx)
    }

    /// Write the session id, editor content, and message count back to the
    /// state file, if there is one.
    pub fn persist(&self) -> Result<()> {
        let Some(file) = &self.state_file else {
            return Ok(());
        };
        file.save(&SessionState {
            session_id: Some(self.session_id.clone()),
            editor_content: Some(self.editor_content.clone()),
            message_count: self.message_count,
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    /// Signed-in users are registered and have no message limit.
    pub fn is_registered(&self) -> bool {
        self.user.is_some()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn editor_content(&self) -> &str {
        &self.editor_content
    }

    pub fn set_editor_content(&mut self, content: impl Into<String>) {
        self.editor_content = content.into();
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn quota_reached(&self) -> bool {
        !self.is_registered() && self.message_count >= limits::MAX_FREE_MESSAGES
    }

    pub fn check_quota(&self) -> Result<()> {
        if self.quota_reached() {
            return Err(anyhow!(messages::QUOTA_EXCEEDED));
        }
        Ok(())
    }

    /// Count a sent message. Registered users are not counted.
    pub fn record_message(&mut self) {
        if !self.is_registered() {
            self.message_count += 1;
        }
    }

    pub fn start_new_session(&mut self) {
        self.session_id = SessionId::generate();
        self.editor_content = editor::NEW_PROMPT.to_string();
        debug!("Started new editor session: {}", self.session_id);
    }

    pub fn open_session(&mut self, record: &SessionRecord) {
        self.session_id = SessionId::from(record.session_id.clone());
        if !record.editor_content.is_empty() {
            self.editor_content = record.editor_content.clone();
        }
        debug!("Loaded editor session: {}", self.session_id);
    }

    /// Forget the user and restart the free-message count.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.message_count = 0;
    }

    /// The record a save would upsert, or `None` when there is no user or
    /// nothing worth saving.
    pub fn session_record(&self, now: DateTime<Utc>) -> Option<SessionRecord> {
        let user = self.user.as_ref()?;
        let content = self.editor_content.trim();
        if content.is_empty() || content == editor::PLACEHOLDER {
            return None;
        }

        Some(SessionRecord {
            user_id: user.id.clone(),
            session_id: self.session_id.to_string(),
            editor_content: content.to_string(),
            session_title: Some(session_title_from_content(content)),
            created_at: None,
            updated_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Skipped,
    Failed,
}

/// Persist the current session. Never fails: store errors are logged.
pub async fn save_session(ctx: &AppContext, store: &dyn SessionStore) -> SaveOutcome {
    match ctx.session_record(Utc::now()) {
        Some(record) => upsert_logged(store, &record).await,
        None => {
            debug!("No session content to save");
            SaveOutcome::Skipped
        }
    }
}

async fn upsert_logged(store: &dyn SessionStore, record: &SessionRecord) -> SaveOutcome {
    debug!("Attempting to save session: {}", record.session_id);
    match store.upsert_session(record).await {
        Ok(()) => {
            debug!("Session saved: {}", record.session_id);
            SaveOutcome::Saved
        }
        Err(err) => {
            warn!("Failed to save session {}: {}", record.session_id, err);
            SaveOutcome::Failed
        }
    }
}

/// Saves the session once the editor has been idle for the debounce window.
pub struct AutoSaver {
    store: Arc<dyn SessionStore>,
    debouncer: Debouncer,
}

impl AutoSaver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_delay(store, timeouts::AUTO_SAVE_DEBOUNCE)
    }

    pub fn with_delay(store: Arc<dyn SessionStore>, delay: std::time::Duration) -> Self {
        Self {
            store,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Editor content changed: restart the idle timer with a snapshot of the
    /// session as it is now.
    pub fn content_changed(&mut self, ctx: &AppContext) {
        if ctx.user().is_none() {
            return;
        }

        let Some(record) = ctx.session_record(Utc::now()) else {
            self.debouncer.cancel();
            return;
        };

        let store = self.store.clone();
        self.debouncer.schedule(async move {
            upsert_logged(store.as_ref(), &record).await;
        });
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Drop any pending save and write the current session right away.
    pub async fn flush(&mut self, ctx: &AppContext) -> SaveOutcome {
        self.debouncer.cancel();
        save_session(ctx, self.store.as_ref()).await
    }
}

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub session_id: String,
    pub title: String,
    pub date: String,
    pub active: bool,
}

impl HistoryEntry {
    pub fn from_record(record: &SessionRecord, current: &SessionId) -> Self {
        Self {
            session_id: record.session_id.clone(),
            title: record
                .session_title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled Prompt".to_string()),
            date: format_date(record.updated_at.as_deref()),
            active: record.session_id == current.as_str(),
        }
    }
}

fn format_date(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// The user's most recent sessions. Empty when signed out or on any error.
pub async fn load_history(ctx: &AppContext, store: &dyn SessionStore) -> Vec<SessionRecord> {
    let Some(user) = ctx.user() else {
        debug!("No user signed in; history is empty");
        return Vec::new();
    };

    match store.list_sessions(&user.id).await {
        Ok(records) => {
            debug!("Loaded {} sessions", records.len());
            records
        }
        Err(err) => {
            warn!("Failed to load session history: {}", err);
            Vec::new()
        }
    }
}

/// Derive a short title for a session from its editor content.
pub fn session_title_from_content(content: &str) -> String {
    if content.trim().is_empty() {
        return "Empty Prompt".to_string();
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Null) | Err(_) => title_from_first_line(content),
        Ok(value) => json_title(&value).unwrap_or_else(|| "JSON Prompt".to_string()),
    }
}

fn json_title(value: &Value) -> Option<String> {
    if let Some(title) = first_string_field(value, &["title", "name", "prompt", "description"]) {
        return Some(title);
    }

    let first = value.as_array()?.first()?;
    match first {
        Value::String(text) if !text.is_empty() => Some(truncate_chars(text)),
        other => first_string_field(other, &["title", "name"]),
    }
}

fn first_string_field(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match value.get(field) {
        Some(Value::String(text)) if !text.is_empty() => Some(truncate_chars(text)),
        _ => None,
    })
}

fn title_from_first_line(content: &str) -> String {
    let first_line = content.split('\n').next().unwrap_or_default().trim();

    if first_line.starts_with("//") || first_line.starts_with("/*") {
        let stripped = LINE_COMMENT.replace(first_line, "");
        let stripped = BLOCK_COMMENT.replace(&stripped, "");
        return truncate_chars(&stripped);
    }

    let truncated = truncate_chars(first_line);
    if first_line.chars().count() > limits::TITLE_MAX_CHARS {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

fn truncate_chars(text: &str) -> String {
    text.chars().take(limits::TITLE_MAX_CHARS).collect()
}
