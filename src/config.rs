//! Runtime-overridable knobs, defaulting to the values spec'd for the index.

/// Configuration for an `Index`. Defaults match the reference constants:
/// `SLOT_SIZE`, `CACHE_SIZE`, `CACHE_DOC_ID_SIZE`, `WRITE_CACHE_SIZE`.
///
/// Tests override `slot_size` to a small number to exercise slot rollover
/// without inserting thousands of documents.
#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    /// Max document IDs held per posting slot before a new slot is allocated.
    pub slot_size: u32,
    /// Byte budget for the posting-list LRU cache.
    pub cache_size_bytes: u64,
    /// Max entries held in the sidecar's trigram-count cache.
    pub cache_doc_id_size: usize,
    /// Max pending entries in the sidecar's write-behind buffer before a flush.
    pub write_cache_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            slot_size: 7500,
            cache_size_bytes: 512 * 1024 * 1024,
            cache_doc_id_size: 10_000_000,
            write_cache_size: 250_000,
        }
    }
}
