//! Byte-budgeted LRU cache over materialized posting lists (spec §3, §4.2).
//!
//! `lru::LruCache` gives us recency ordering and O(1) `pop_lru`; we keep it
//! unbounded by entry count and evict purely by the running byte charge
//! (`items * 8`), which is the accounting rule the spec requires and which a
//! capacity-bounded `LruCache` alone can't express.

use std::sync::Arc;

use lru::LruCache;

use crate::{DocId, Gram};

const ID_BYTES: u64 = 8;

pub struct PostingCache {
    entries: LruCache<Gram, Arc<Vec<DocId>>>,
    budget_bytes: u64,
    used_bytes: u64,
}

impl PostingCache {
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            entries: LruCache::unbounded(),
            budget_bytes,
            used_bytes: 0,
        }
    }

    pub fn get(&mut self, gram: &str) -> Option<Arc<Vec<DocId>>> {
        self.entries.get(gram).cloned()
    }

    /// Drops the cached entry for `gram`, if any. Called before every write
    /// to that trigram's posting chain so the cache never serves stale data.
    pub fn invalidate(&mut self, gram: &str) {
        if let Some(old) = self.entries.pop(gram) {
            self.used_bytes -= charge(old.len());
        }
    }

    pub fn insert(&mut self, gram: Gram, items: Arc<Vec<DocId>>) {
        let new_charge = charge(items.len());
        if let Some(old) = self.entries.put(gram, items) {
            self.used_bytes -= charge(old.len());
        }
        self.used_bytes += new_charge;

        while self.used_bytes > self.budget_bytes {
            match self.entries.pop_lru() {
                Some((_, evicted)) => self.used_bytes -= charge(evicted.len()),
                None => break,
            }
        }
    }
}

fn charge(item_count: usize) -> u64 {
    item_count as u64 * ID_BYTES
}
