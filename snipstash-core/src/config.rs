use std::time::Duration;

/// Default interval between background sweeps (5 minutes)
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default snippet lifetime when the caller gives none (24 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a [`SnippetStore`](crate::SnippetStore)
///
/// # Example
///
/// ```rust
/// use snipstash_core::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_cleanup_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between sweeps of expired snippets (default: 5 minutes)
    pub cleanup_interval: Duration,
    /// Lifetime applied when an insert carries no TTL (default: 24 hours)
    pub default_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often the background sweeper removes expired snippets.
    ///
    /// ```rust
    /// use snipstash_core::StoreConfig;
    /// use std::time::Duration;
    ///
    /// let config = StoreConfig::default()
    ///     .with_cleanup_interval(Duration::from_secs(30));
    /// ```
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets the lifetime used for inserts that omit a TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}
