//! Read-only observability for a running `Index`.
//!
//! `trident` ships an `index::stats` module purely to report on a completed
//! build (`IndexStats`/`TrigramPostingStats`). This keeps the same spirit at
//! serve time instead: counters an operator can poll, never an input to
//! `rank::rank`'s similarity computation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of index-level counters, returned by `Index::stats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    /// Number of documents inserted so far (the current ID counter value).
    pub documents: u64,
    /// Number of distinct grams known to the posting header.
    pub unique_trigrams: usize,
    /// Posting-list cache hits since open.
    pub posting_cache_hits: u64,
    /// Posting-list cache misses since open.
    pub posting_cache_misses: u64,
}

/// Interior-mutable counters accumulated during operation, snapshotted into
/// `IndexStats` on demand.
#[derive(Debug, Default)]
pub struct Counters {
    pub posting_cache_hits: AtomicU64,
    pub posting_cache_misses: AtomicU64,
}

impl Counters {
    pub fn record_cache_hit(&self) {
        self.posting_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.posting_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, documents: u64, unique_trigrams: usize) -> IndexStats {
        IndexStats {
            documents,
            unique_trigrams,
            posting_cache_hits: self.posting_cache_hits.load(Ordering::Relaxed),
            posting_cache_misses: self.posting_cache_misses.load(Ordering::Relaxed),
        }
    }
}
