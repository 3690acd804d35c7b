//! Aggregate view of the whole store for the admin endpoint.

use serde::Serialize;

use crate::bucket::OwnerBucket;
use crate::snippet::Snippet;

/// Number of payload characters shown in a [`SnippetSummary`]
pub const PREVIEW_CHARS: usize = 100;

/// Every active owner with per-snippet metadata, plus totals.
///
/// Serializes as `{totalUsers, totalSnippets, users}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSnapshot {
    pub total_users: usize,
    pub total_snippets: usize,
    pub users: Vec<OwnerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub username: String,
    pub snippet_count: usize,
    pub snippets: Vec<SnippetSummary>,
}

/// Snippet metadata without the full payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetSummary {
    pub id: String,
    pub language: String,
    pub created_at: u64,
    pub expires_at: u64,
    pub code_preview: String,
    pub size: usize,
}

impl AdminSnapshot {
    /// Builds the snapshot and its totals. Owners are sorted by name.
    pub(crate) fn from_owners(mut users: Vec<OwnerSummary>) -> Self {
        users.sort_by(|a, b| a.username.cmp(&b.username));
        let total_snippets = users.iter().map(|user| user.snippet_count).sum();
        Self {
            total_users: users.len(),
            total_snippets,
            users,
        }
    }
}

impl OwnerSummary {
    pub(crate) fn from_bucket(owner: &str, bucket: &OwnerBucket) -> Self {
        let snippets: Vec<SnippetSummary> = bucket.iter().map(SnippetSummary::from).collect();
        Self {
            username: owner.to_string(),
            snippet_count: snippets.len(),
            snippets,
        }
    }
}

impl From<&Snippet> for SnippetSummary {
    fn from(snippet: &Snippet) -> Self {
        Self {
            id: snippet.id().to_string(),
            language: snippet.language().to_string(),
            created_at: snippet.created_at(),
            expires_at: snippet.expires_at(),
            code_preview: snippet.preview(PREVIEW_CHARS),
            size: snippet.size(),
        }
    }
}
