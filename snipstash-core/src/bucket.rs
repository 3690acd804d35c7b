use std::collections::VecDeque;

use crate::snippet::Snippet;

/// Maximum number of snippets kept per owner
pub const BUCKET_CAPACITY: usize = 10;

/// One owner's snippets, oldest first.
///
/// Never holds more than [`BUCKET_CAPACITY`] entries. The store removes a
/// bucket from its map as soon as it becomes empty.
#[derive(Debug, Default)]
pub(crate) struct OwnerBucket {
    snippets: VecDeque<Snippet>,
}

impl OwnerBucket {
    /// Appends a snippet and drops the oldest ones beyond the capacity.
    ///
    /// Returns the number of evicted snippets.
    pub(crate) fn push_bounded(&mut self, snippet: Snippet) -> usize {
        self.snippets.push_back(snippet);
        let mut evicted = 0;
        while self.snippets.len() > BUCKET_CAPACITY {
            self.snippets.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Removes every snippet expired at `now_ms`, keeping order.
    ///
    /// Returns the number of removed snippets.
    pub(crate) fn purge_expired(&mut self, now_ms: u64) -> usize {
        let before = self.snippets.len();
        self.snippets.retain(|snippet| !snippet.is_expired_at(now_ms));
        before - self.snippets.len()
    }

    /// Snippets still active at `now_ms`, without touching the bucket
    pub(crate) fn active_at(&self, now_ms: u64) -> impl Iterator<Item = &Snippet> {
        self.snippets
            .iter()
            .filter(move |snippet| !snippet.is_expired_at(now_ms))
    }

    pub(crate) fn find(&self, snippet_id: &str) -> Option<&Snippet> {
        self.snippets.iter().find(|snippet| snippet.id() == snippet_id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.snippets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}
