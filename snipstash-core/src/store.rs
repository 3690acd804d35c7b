use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::admin::{AdminSnapshot, OwnerSummary};
use crate::bucket::OwnerBucket;
use crate::clock::now_millis;
use crate::config::StoreConfig;
use crate::error::{Missing, StoreError};
use crate::id::generate_snippet_id;
use crate::snippet::{Snippet, DEFAULT_LANGUAGE};

/// Result of a successful [`SnippetStore::insert`].
///
/// Serializes as `{snippetId, expiresAt, language}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedSnippet {
    pub snippet_id: String,
    pub expires_at: u64,
    pub language: String,
    #[serde(skip_serializing)]
    pub created_at: u64,
}

/// Internal shared state for the store
struct StoreInner {
    data: DashMap<String, OwnerBucket>,
    /// Sender to signal shutdown to the sweeper task
    shutdown_tx: watch::Sender<bool>,
    config: StoreConfig,
}

/// Thread-safe in-memory snippet store grouped by owner.
///
/// Each owner maps to a bucket of at most
/// [`BUCKET_CAPACITY`](crate::BUCKET_CAPACITY) snippets in insertion order.
/// Buckets live in a `DashMap`; every mutation of one owner's bucket runs
/// under that bucket's shard lock, so concurrent inserts for the same owner
/// never lose entries or overflow the bound. An owner whose bucket empties is
/// removed from the map.
///
/// Each store spawns its own background sweeper that periodically removes
/// expired snippets. The sweeper stops on [`shutdown`](Self::shutdown) or
/// when the last clone of the store is dropped.
///
/// # Reads may purge
///
/// [`list_active`](Self::list_active) and
/// [`admin_snapshot`](Self::admin_snapshot) drop expired snippets from the
/// stored buckets as a side effect. [`peek`](Self::peek) and
/// [`get_by_id`](Self::get_by_id) never mutate.
///
/// # Example
///
/// ```rust,no_run
/// use snipstash_core::SnippetStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = SnippetStore::new();
///
///     let inserted = store.insert("alice", "print(1)", Some("python"), None).unwrap();
///     let snippet = store.get_by_id("alice", &inserted.snippet_id).unwrap();
///     assert_eq!(snippet.code(), "print(1)");
///
///     store.shutdown();
/// }
/// ```
#[derive(Clone)]
pub struct SnippetStore {
    inner: Arc<StoreInner>,
}

impl SnippetStore {
    /// Creates a new store with default configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The store requires
    /// a runtime to spawn its background sweeper.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a new store with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The store requires
    /// a runtime to spawn its background sweeper.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::start(config).0
    }

    /// Builds the store and spawns its sweeper, returning the sweeper's handle
    fn start(config: StoreConfig) -> (Self, JoinHandle<()>) {
        if tokio::runtime::Handle::try_current().is_err() {
            panic!(
                "snipstash_core::SnippetStore requires a Tokio runtime. \
                 Call SnippetStore::new() or SnippetStore::with_config() \
                 from within a #[tokio::main] or #[tokio::test] context, \
                 or from code running on a Tokio runtime."
            );
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        // tokio::time::interval panics on a zero period
        let interval = config.cleanup_interval.max(Duration::from_millis(1));

        let inner = Arc::new(StoreInner {
            data: DashMap::new(),
            shutdown_tx,
            config,
        });

        // The sweeper only holds a weak handle so dropping the last store frees it
        let sweeper = tokio::spawn(Self::sweeper_task(
            Arc::downgrade(&inner),
            interval,
            shutdown_rx,
        ));

        (Self { inner }, sweeper)
    }

    /// Background task that periodically sweeps expired snippets
    async fn sweeper_task(
        inner: Weak<StoreInner>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick - we want to wait for the interval first
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(inner) = inner.upgrade() else {
                        break;
                    };
                    let removed = Self::sweep_internal(&inner);
                    if removed > 0 {
                        tracing::debug!(removed, owners = inner.data.len(), "swept expired snippets");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("snippet sweeper stopped");
    }

    /// Sweep logic shared between the background task and [`sweep`](Self::sweep)
    fn sweep_internal(inner: &StoreInner) -> usize {
        let now = now_millis();
        let mut removed = 0;

        inner.data.retain(|_, bucket| {
            removed += bucket.purge_expired(now);
            !bucket.is_empty()
        });

        removed
    }

    /// Stores a snippet for `owner` and returns its id and expiration.
    ///
    /// A missing or empty `language` becomes `"plaintext"`. A missing or zero
    /// `ttl` uses the configured default (24 hours unless overridden). When
    /// the owner already holds the maximum number of snippets, the oldest are
    /// evicted to make room.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` if `owner` or `code` is empty.
    pub fn insert(
        &self,
        owner: &str,
        code: &str,
        language: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<InsertedSnippet, StoreError> {
        if owner.is_empty() {
            return Err(StoreError::invalid("owner"));
        }
        if code.is_empty() {
            return Err(StoreError::invalid("code"));
        }

        let language = language
            .filter(|lang| !lang.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        let ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.inner.config.default_ttl);
        // Sub-millisecond TTLs still have to land strictly after creation
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let created_at = now_millis();
        let expires_at = created_at.saturating_add(ttl_ms);
        let snippet_id = generate_snippet_id();
        let snippet = Snippet::new(snippet_id.as_str(), code, language, created_at, expires_at);

        let evicted = {
            let mut bucket = self.inner.data.entry(owner.to_string()).or_default();
            bucket.push_bounded(snippet)
        };

        tracing::debug!(
            owner = %truncate_for_log(owner),
            snippet_id = %snippet_id,
            ttl_ms,
            evicted,
            "inserted snippet"
        );

        Ok(InsertedSnippet {
            snippet_id,
            expires_at,
            language: language.to_string(),
            created_at,
        })
    }

    /// Returns the owner's active snippets in insertion order, purging the
    /// expired ones from the store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound(Missing::Owner)` if the owner has no bucket, and
    /// `NotFound(Missing::ActiveSnippets)` if every snippet had expired. In
    /// the latter case the bucket is removed before returning.
    pub fn list_active(&self, owner: &str) -> Result<Vec<Snippet>, StoreError> {
        let now = now_millis();

        match self.inner.data.entry(owner.to_string()) {
            Entry::Vacant(_) => Err(StoreError::NotFound(Missing::Owner)),
            Entry::Occupied(mut occupied) => {
                let purged = occupied.get_mut().purge_expired(now);
                if purged > 0 {
                    tracing::debug!(owner = %truncate_for_log(owner), purged, "purged expired snippets on read");
                }

                if occupied.get().is_empty() {
                    occupied.remove();
                    return Err(StoreError::NotFound(Missing::ActiveSnippets));
                }

                Ok(occupied.get().iter().cloned().collect())
            }
        }
    }

    /// Same result as [`list_active`](Self::list_active) without purging
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the owner is unknown or has no active snippet.
    pub fn peek(&self, owner: &str) -> Result<Vec<Snippet>, StoreError> {
        let now = now_millis();
        let bucket = self
            .inner
            .data
            .get(owner)
            .ok_or(StoreError::NotFound(Missing::Owner))?;

        let active: Vec<Snippet> = bucket.active_at(now).cloned().collect();
        if active.is_empty() {
            return Err(StoreError::NotFound(Missing::ActiveSnippets));
        }
        Ok(active)
    }

    /// Looks up one snippet by id.
    ///
    /// An expired snippet that hasn't been swept yet is reported as not found
    /// but left in place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound(Missing::Owner)` for an unknown owner and
    /// `NotFound(Missing::Snippet)` for an unknown or expired id.
    pub fn get_by_id(&self, owner: &str, snippet_id: &str) -> Result<Snippet, StoreError> {
        let now = now_millis();
        let bucket = self
            .inner
            .data
            .get(owner)
            .ok_or(StoreError::NotFound(Missing::Owner))?;

        bucket
            .find(snippet_id)
            .filter(|snippet| !snippet.is_expired_at(now))
            .cloned()
            .ok_or(StoreError::NotFound(Missing::Snippet))
    }

    /// Purges expired snippets everywhere and summarizes what remains.
    ///
    /// Owners left empty by the purge are removed and don't appear in the
    /// snapshot. Users are sorted by name.
    pub fn admin_snapshot(&self) -> AdminSnapshot {
        let now = now_millis();
        let mut users = Vec::new();
        let mut purged = 0;

        self.inner.data.retain(|owner, bucket| {
            purged += bucket.purge_expired(now);
            if bucket.is_empty() {
                return false;
            }
            users.push(OwnerSummary::from_bucket(owner, bucket));
            true
        });

        let snapshot = AdminSnapshot::from_owners(users);
        tracing::debug!(
            users = snapshot.total_users,
            snippets = snapshot.total_snippets,
            purged,
            "built admin snapshot"
        );
        snapshot
    }

    /// Manually sweeps expired snippets and empty owners.
    ///
    /// Returns the number of snippets removed.
    ///
    /// Note: This is also done automatically by the background task.
    pub fn sweep(&self) -> usize {
        Self::sweep_internal(&self.inner)
    }

    /// Number of owners with a bucket (buckets may still hold unswept
    /// expired snippets)
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.inner.data.len()
    }

    /// Number of stored snippets across all owners, including expired ones
    /// not yet purged
    #[must_use]
    pub fn snippet_count(&self) -> usize {
        self.inner.data.iter().map(|bucket| bucket.len()).sum()
    }

    /// Returns `true` if no owner has a bucket
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Stops the background sweeper.
    ///
    /// This is called automatically when the last clone of the store is
    /// dropped, but can be called manually, e.g. during server shutdown.
    pub fn shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(true);
    }

    /// Stores a snippet that is already expired (for testing purposes)
    #[cfg(test)]
    fn insert_expired(&self, owner: &str, code: &str) -> String {
        let expires_at = now_millis() - 1_000;
        let id = generate_snippet_id();
        let snippet = Snippet::new(id.as_str(), code, DEFAULT_LANGUAGE, expires_at - 1, expires_at);
        self.inner
            .data
            .entry(owner.to_string())
            .or_default()
            .push_bounded(snippet);
        id
    }
}

impl Default for SnippetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        // Signal the sweeper to stop when the store is dropped
        let _ = self.shutdown_tx.send(true);
    }
}

/// Truncates an owner name for logging (prevents leaking long names into logs)
pub fn truncate_for_log(owner: &str) -> String {
    const MAX_LOG_CHARS: usize = 16;
    match owner.char_indices().nth(MAX_LOG_CHARS) {
        Some((cut, _)) => format!("{}...", &owner[..cut]),
        None => owner.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BUCKET_CAPACITY;
    use std::collections::HashSet;
    use std::thread;

    /// Helper to create a store within a tokio runtime for tests
    fn create_test_store() -> SnippetStore {
        // Long interval so the sweeper never interferes
        create_test_store_with_config(
            StoreConfig::default().with_cleanup_interval(Duration::from_secs(3600)),
        )
    }

    fn create_test_store_with_config(config: StoreConfig) -> SnippetStore {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        // Keep the runtime alive by leaking it (fine for tests)
        let rt = Box::leak(Box::new(rt));
        let _guard = rt.enter();

        SnippetStore::with_config(config)
    }

    fn codes(snippets: &[Snippet]) -> Vec<&str> {
        snippets.iter().map(Snippet::code).collect()
    }

    #[test]
    fn test_insert_defaults() {
        let store = create_test_store();
        let inserted = store.insert("alice", "print(1)", None, None).unwrap();

        assert_eq!(inserted.language, "plaintext");
        assert_eq!(inserted.expires_at - inserted.created_at, 86_400_000);

        let snippet = store.get_by_id("alice", &inserted.snippet_id).unwrap();
        assert_eq!(snippet.code(), "print(1)");
        assert_eq!(snippet.language(), "plaintext");
        assert_eq!(snippet.expires_at() - snippet.created_at(), 86_400_000);
    }

    #[test]
    fn test_insert_empty_language_and_zero_ttl_use_defaults() {
        let store = create_test_store();
        let inserted = store
            .insert("alice", "x", Some(""), Some(Duration::ZERO))
            .unwrap();
        assert_eq!(inserted.language, "plaintext");
        assert_eq!(inserted.expires_at - inserted.created_at, 86_400_000);
    }

    #[test]
    fn test_insert_custom_language_and_ttl() {
        let store = create_test_store();
        let inserted = store
            .insert("alice", "fn main() {}", Some("rust"), Some(Duration::from_secs(60)))
            .unwrap();
        assert_eq!(inserted.language, "rust");
        assert_eq!(inserted.expires_at - inserted.created_at, 60_000);
    }

    #[test]
    fn test_insert_uses_configured_default_ttl() {
        let store = create_test_store_with_config(
            StoreConfig::default()
                .with_cleanup_interval(Duration::from_secs(3600))
                .with_default_ttl(Duration::from_secs(5)),
        );
        let inserted = store.insert("alice", "x", None, None).unwrap();
        assert_eq!(inserted.expires_at - inserted.created_at, 5_000);
    }

    #[test]
    fn test_insert_sub_millisecond_ttl_still_expires_after_creation() {
        let store = create_test_store();
        let inserted = store
            .insert("alice", "x", None, Some(Duration::from_micros(10)))
            .unwrap();
        assert!(inserted.expires_at > inserted.created_at);
    }

    #[test]
    fn test_insert_extreme_ttl_does_not_panic() {
        let store = create_test_store();
        let inserted = store
            .insert("alice", "x", None, Some(Duration::MAX))
            .unwrap();
        assert_eq!(inserted.expires_at, u64::MAX);
        assert!(store.get_by_id("alice", &inserted.snippet_id).is_ok());
    }

    #[test]
    fn test_insert_rejects_empty_owner_or_code() {
        let store = create_test_store();

        let err = store.insert("", "code", None, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let err = store.insert("alice", "", None, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        assert!(store.is_empty());
    }

    #[test]
    fn test_owner_names_are_case_sensitive() {
        let store = create_test_store();
        store.insert("Alice", "upper", None, None).unwrap();
        store.insert("alice", "lower", None, None).unwrap();

        assert_eq!(store.owner_count(), 2);
        assert_eq!(codes(&store.list_active("Alice").unwrap()), vec!["upper"]);
        assert_eq!(codes(&store.list_active("alice").unwrap()), vec!["lower"]);
    }

    #[test]
    fn test_eleven_inserts_keep_last_ten_in_order() {
        let store = create_test_store();
        for i in 0..11 {
            store.insert("bob", &format!("snippet {i}"), None, None).unwrap();
        }

        let snippets = store.list_active("bob").unwrap();
        let expected: Vec<String> = (1..11).map(|i| format!("snippet {i}")).collect();
        assert_eq!(snippets.len(), BUCKET_CAPACITY);
        assert_eq!(codes(&snippets), expected);
    }

    #[test]
    fn test_evicted_snippet_is_not_found_by_id() {
        let store = create_test_store();
        let first = store.insert("bob", "first", None, None).unwrap();
        for i in 0..BUCKET_CAPACITY {
            store.insert("bob", &i.to_string(), None, None).unwrap();
        }

        let err = store.get_by_id("bob", &first.snippet_id).unwrap_err();
        assert_eq!(err, StoreError::NotFound(Missing::Snippet));
    }

    #[test]
    fn test_get_by_id_after_short_ttl_is_not_found() {
        let store = create_test_store();
        let inserted = store
            .insert("carol", "x", None, Some(Duration::from_millis(1)))
            .unwrap();

        thread::sleep(Duration::from_millis(5));

        let err = store.get_by_id("carol", &inserted.snippet_id).unwrap_err();
        assert_eq!(err, StoreError::NotFound(Missing::Snippet));
        // Not deleted as a side effect
        assert_eq!(store.snippet_count(), 1);
    }

    #[test]
    fn test_get_by_id_unknown_owner_and_id() {
        let store = create_test_store();
        assert_eq!(
            store.get_by_id("nobody", "abc").unwrap_err(),
            StoreError::NotFound(Missing::Owner)
        );

        store.insert("dave", "x", None, None).unwrap();
        assert_eq!(
            store.get_by_id("dave", "abc").unwrap_err(),
            StoreError::NotFound(Missing::Snippet)
        );
    }

    #[test]
    fn test_list_active_unknown_owner() {
        let store = create_test_store();
        assert_eq!(
            store.list_active("nobody").unwrap_err(),
            StoreError::NotFound(Missing::Owner)
        );
        // The lookup must not create a bucket
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_active_purges_expired() {
        let store = create_test_store();
        store.insert_expired("erin", "old");
        store.insert("erin", "fresh", None, None).unwrap();
        store.insert_expired("erin", "old again");

        assert_eq!(store.snippet_count(), 3);
        let snippets = store.list_active("erin").unwrap();
        assert_eq!(codes(&snippets), vec!["fresh"]);
        assert_eq!(store.snippet_count(), 1);
    }

    #[test]
    fn test_list_active_all_expired_removes_owner() {
        let store = create_test_store();
        store.insert_expired("frank", "a");
        store.insert_expired("frank", "b");

        assert_eq!(
            store.list_active("frank").unwrap_err(),
            StoreError::NotFound(Missing::ActiveSnippets)
        );
        assert_eq!(store.owner_count(), 0);
        assert_eq!(
            store.list_active("frank").unwrap_err(),
            StoreError::NotFound(Missing::Owner)
        );
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let store = create_test_store();
        store.insert_expired("gina", "old");
        store.insert("gina", "fresh", None, None).unwrap();

        assert_eq!(codes(&store.peek("gina").unwrap()), vec!["fresh"]);
        assert_eq!(store.snippet_count(), 2);

        store.insert_expired("hank", "old");
        assert_eq!(
            store.peek("hank").unwrap_err(),
            StoreError::NotFound(Missing::ActiveSnippets)
        );
        assert_eq!(store.owner_count(), 2);
        assert_eq!(
            store.peek("nobody").unwrap_err(),
            StoreError::NotFound(Missing::Owner)
        );
    }

    #[test]
    fn test_admin_snapshot_purges_and_aggregates() {
        let store = create_test_store();
        store.insert("alice", "a1", Some("rust"), None).unwrap();
        store.insert("alice", "a2", None, None).unwrap();
        store.insert_expired("alice", "stale");
        store.insert("bob", &"x".repeat(120), None, None).unwrap();
        store.insert_expired("ghost", "gone");

        let snapshot = store.admin_snapshot();

        assert_eq!(snapshot.total_users, 2);
        assert_eq!(snapshot.total_snippets, 3);
        assert_eq!(snapshot.users[0].username, "alice");
        assert_eq!(snapshot.users[0].snippet_count, 2);
        assert_eq!(snapshot.users[0].snippets[0].language, "rust");
        assert_eq!(snapshot.users[1].username, "bob");
        assert_eq!(snapshot.users[1].snippets[0].size, 120);
        assert!(snapshot.users[1].snippets[0].code_preview.ends_with("..."));

        // Purged in place
        assert_eq!(store.owner_count(), 2);
        assert_eq!(store.snippet_count(), 3);
    }

    #[test]
    fn test_admin_snapshot_empty_store() {
        let store = create_test_store();
        let snapshot = store.admin_snapshot();
        assert_eq!(snapshot.total_users, 0);
        assert_eq!(snapshot.total_snippets, 0);
        assert!(snapshot.users.is_empty());
    }

    #[test]
    fn test_sweep_removes_expired_and_empty_owners() {
        let store = create_test_store();
        store.insert_expired("expired1", "value");
        store.insert_expired("expired2", "value");
        store.insert_expired("mixed", "value");
        store.insert("mixed", "keep", None, None).unwrap();

        assert_eq!(store.sweep(), 3);
        assert_eq!(store.owner_count(), 1);
        assert_eq!(codes(&store.list_active("mixed").unwrap()), vec!["keep"]);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let store = create_test_store();
        store.insert_expired("a", "value");
        store.insert("b", "value", None, None).unwrap();

        assert_eq!(store.sweep(), 1);
        let owners = store.owner_count();
        let snippets = store.snippet_count();

        assert_eq!(store.sweep(), 0);
        assert_eq!(store.owner_count(), owners);
        assert_eq!(store.snippet_count(), snippets);
    }

    #[test]
    fn test_expired_snippet_never_returned() {
        let store = create_test_store();
        let inserted = store
            .insert("ivy", "short", None, Some(Duration::from_millis(1)))
            .unwrap();
        store.insert("ivy", "long", None, None).unwrap();

        thread::sleep(Duration::from_millis(5));

        assert!(store.get_by_id("ivy", &inserted.snippet_id).is_err());
        assert_eq!(codes(&store.list_active("ivy").unwrap()), vec!["long"]);
        let snapshot = store.admin_snapshot();
        assert!(snapshot.users[0]
            .snippets
            .iter()
            .all(|s| s.id != inserted.snippet_id));
    }

    #[test]
    fn test_concurrent_inserts_distinct_owners() {
        let store = create_test_store();
        let mut handles = vec![];

        for thread_id in 0..10 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..5 {
                    store
                        .insert(&format!("owner{thread_id}"), &format!("code{i}"), None, None)
                        .unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(store.owner_count(), 10);
        assert_eq!(store.snippet_count(), 50);
    }

    #[test]
    fn test_concurrent_inserts_same_owner_respect_bound() {
        let store = create_test_store();
        let mut handles = vec![];

        for thread_id in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let mut ids = Vec::new();
                for i in 0..50 {
                    let inserted = store
                        .insert("contested", &format!("t{thread_id}:{i}"), None, None)
                        .unwrap();
                    ids.push(inserted.snippet_id);
                }
                ids
            }));
        }

        let mut all_ids = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("Thread panicked") {
                assert!(all_ids.insert(id), "duplicate snippet id");
            }
        }

        assert_eq!(all_ids.len(), 400);
        assert_eq!(store.owner_count(), 1);
        assert_eq!(store.list_active("contested").unwrap().len(), BUCKET_CAPACITY);
    }

    #[test]
    fn test_concurrent_sweep_with_operations() {
        let store = create_test_store();

        for i in 0..50 {
            store.insert_expired(&format!("expiring{i}"), "value");
            store.insert(&format!("persistent{i}"), "value", None, None).unwrap();
        }

        let mut handles: Vec<thread::JoinHandle<()>> = vec![];

        let sweeper = store.clone();
        handles.push(thread::spawn(move || {
            let _ = sweeper.sweep();
        }));

        for _ in 0..3 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let _ = store.list_active(&format!("expiring{i}"));
                    let _ = store.list_active(&format!("persistent{i}"));
                    let _ = store.admin_snapshot();
                }
            }));
        }

        let writer = store.clone();
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                writer.insert(&format!("new{i}"), "value", None, None).unwrap();
            }
        }));

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        // Expiring owners are gone, persistent + new remain
        let _ = store.sweep();
        assert_eq!(store.owner_count(), 100);
        for i in 0..50 {
            assert!(store.list_active(&format!("persistent{i}")).is_ok());
            assert!(store.list_active(&format!("new{i}")).is_ok());
        }
    }

    #[tokio::test]
    async fn test_background_sweep_runs() {
        let config = StoreConfig::default().with_cleanup_interval(Duration::from_millis(50));
        let store = SnippetStore::with_config(config);

        store.insert_expired("expire1", "value1");
        store.insert_expired("expire2", "value2");
        store.insert("keep", "value3", None, None).unwrap();

        // Nothing is purged until the sweeper runs
        assert_eq!(store.owner_count(), 3);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.owner_count(), 1);
        assert_eq!(codes(&store.list_active("keep").unwrap()), vec!["value3"]);
    }

    #[tokio::test]
    async fn test_store_clone_shares_data() {
        let store1 = SnippetStore::new();
        let store2 = store1.clone();

        let inserted = store1.insert("alice", "value1", None, None).unwrap();
        assert!(store2.get_by_id("alice", &inserted.snippet_id).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeper() {
        let config = StoreConfig::default().with_cleanup_interval(Duration::from_millis(20));
        let store = SnippetStore::with_config(config);

        store.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;

        store.insert_expired("stale", "value");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The sweeper is gone, so the expired snippet is still stored
        assert_eq!(store.snippet_count(), 1);
        // Manual sweeps keep working after shutdown
        assert_eq!(store.sweep(), 1);
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_sweeper() {
        let config = StoreConfig::default().with_cleanup_interval(Duration::from_millis(20));
        let (store, sweeper) = SnippetStore::start(config);
        let clone = store.clone();

        store.insert("alice", "value", None, None).unwrap();
        drop(store);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // One live clone keeps the sweeper running
        assert!(!sweeper.is_finished());

        drop(clone);
        let finished = tokio::time::timeout(Duration::from_secs(1), sweeper).await;
        assert!(finished.is_ok(), "sweeper still running after the last handle was dropped");
        assert!(finished.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_multiple_stores_independent_sweepers() {
        let store1 =
            SnippetStore::with_config(StoreConfig::default().with_cleanup_interval(Duration::from_millis(50)));
        let store2 =
            SnippetStore::with_config(StoreConfig::default().with_cleanup_interval(Duration::from_secs(60)));

        store1.insert_expired("expire", "value");
        store2.insert_expired("stale", "value");

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store1.owner_count(), 0);
        assert_eq!(store2.owner_count(), 1);
    }

    #[test]
    #[should_panic(expected = "requires a Tokio runtime")]
    fn test_new_outside_runtime_panics() {
        let _ = SnippetStore::new();
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        assert_eq!(
            truncate_for_log("this_is_a_very_long_owner_name"),
            "this_is_a_very_l..."
        );
    }
}
