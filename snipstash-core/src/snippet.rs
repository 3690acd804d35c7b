use serde::Serialize;
use std::sync::Arc;

/// Language tag used when an insert doesn't name one
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// An immutable code snippet with an absolute expiration time.
///
/// Timestamps are milliseconds since the Unix epoch. Serializes as
/// `{id, code, language, createdAt, expiresAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    id: Arc<str>,
    code: Arc<str>,
    language: Arc<str>,
    created_at: u64,
    expires_at: u64,
}

impl Snippet {
    /// Creates a snippet. `expires_at` must be later than `created_at`.
    pub fn new(
        id: impl Into<Arc<str>>,
        code: impl Into<Arc<str>>,
        language: impl Into<Arc<str>>,
        created_at: u64,
        expires_at: u64,
    ) -> Self {
        debug_assert!(expires_at > created_at);
        Self {
            id: id.into(),
            code: code.into(),
            language: language.into(),
            created_at,
            expires_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Checks whether the snippet is expired at `now_ms`
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Payload length in characters
    pub fn size(&self) -> usize {
        self.code.chars().count()
    }

    /// The first `limit` characters of the payload, with `...` appended when
    /// anything was cut off.
    pub fn preview(&self, limit: usize) -> String {
        match self.code.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}...", &self.code[..cut]),
            None => self.code.to_string(),
        }
    }
}
