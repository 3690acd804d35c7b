//! # Snipstash Core
//!
//! An in-memory store for named, expiring code snippets.
//!
//! ## Features
//!
//! - Snippets grouped by owner name, at most 10 per owner (oldest evicted first)
//! - Thread-safe storage using `DashMap`; each owner's bucket is updated atomically
//! - Expired snippets are never returned, and are purged on listing reads
//! - Background sweeper per store instance, stopped by `shutdown()` or on drop
//!
//! ## Example
//!
//! ```rust,no_run
//! use snipstash_core::{SnippetStore, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create store with default config (5 minute sweep interval)
//!     let store = SnippetStore::new();
//!
//!     // Or with a custom sweep interval
//!     let config = StoreConfig::default()
//!         .with_cleanup_interval(Duration::from_secs(30));
//!     let store = SnippetStore::with_config(config);
//!
//!     // Store a snippet that lives for one hour
//!     let inserted = store
//!         .insert("alice", "print('hi')", Some("python"), Some(Duration::from_secs(3600)))
//!         .unwrap();
//!
//!     // List everything alice still has
//!     for snippet in store.list_active("alice").unwrap() {
//!         println!("{} [{}]", snippet.id(), snippet.language());
//!     }
//!
//!     // Fetch a single snippet
//!     let snippet = store.get_by_id("alice", &inserted.snippet_id).unwrap();
//!     println!("{}", snippet.code());
//!
//!     // Manual sweep (also done automatically by the background task)
//!     let removed = store.sweep();
//!
//!     store.shutdown();
//! }
//! ```

mod admin;
mod bucket;
mod clock;
mod config;
mod error;
mod id;
mod snippet;
mod store;

pub use admin::{AdminSnapshot, OwnerSummary, SnippetSummary, PREVIEW_CHARS};
pub use bucket::BUCKET_CAPACITY;
pub use clock::now_millis;
pub use config::{StoreConfig, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL};
pub use error::{Missing, StoreError};
pub use id::generate_snippet_id;
pub use snippet::{Snippet, DEFAULT_LANGUAGE};
pub use store::{truncate_for_log, InsertedSnippet, SnippetStore};
