use thiserror::Error;

/// Errors returned by [`SnippetStore`](crate::SnippetStore) operations.
///
/// Every failure is local to the call that produced it; the store is left
/// consistent and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required input was missing or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Nothing active matched the lookup
    #[error("not found: {0}")]
    NotFound(Missing),
}

/// What a [`StoreError::NotFound`] failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Missing {
    /// The owner has no bucket at all
    #[error("no snippets for owner")]
    Owner,

    /// The owner had a bucket, but every snippet in it had expired
    #[error("no active snippets for owner")]
    ActiveSnippets,

    /// The id is unknown for this owner, or the snippet has expired
    #[error("snippet not found or expired")]
    Snippet,
}

impl StoreError {
    pub(crate) fn invalid(what: &str) -> Self {
        StoreError::InvalidArgument(format!("{what} cannot be empty"))
    }
}
