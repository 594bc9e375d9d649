//! Persistent `doc_id -> trigram_count` array (spec §4.3): a dense `u32` LE
//! array on disk, fronted by a bounded read cache and a write-behind buffer.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;

use crate::config::IndexConfig;
use crate::ioutil::FileCursor;
use crate::DocId;

const COUNTER_BYTES: u64 = 8;
const COUNT_BYTES: u64 = 4;
const PREWARM_LIMIT: u64 = 5_000_000;

pub struct DocumentSidecar {
    inner: Mutex<Inner>,
}

struct Inner {
    file: FileCursor,
    cache: HashMap<DocId, u32>,
    write_buffer: Vec<DocId>,
    cache_doc_id_size: usize,
    write_cache_size: usize,
}

impl DocumentSidecar {
    pub fn open(path: impl AsRef<Path>, config: &IndexConfig) -> Result<(Self, u64)> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .with_context(|| format!("opening sidecar file {path:?}"))?;
        let cursor = FileCursor::new(file);

        let existing_len = cursor.len().context("stat sidecar file")?;
        let item_id = if existing_len == 0 {
            cursor.write_at(&[0u8; COUNTER_BYTES as usize], 0)?;
            0
        } else {
            let mut buf = [0u8; COUNTER_BYTES as usize];
            cursor.read_at(&mut buf, 0)?;
            LittleEndian::read_u64(&buf)
        };

        let mut cache = HashMap::new();
        let prewarm_count = item_id.min(PREWARM_LIMIT);
        if prewarm_count > 0 {
            let mut buf = vec![0u8; prewarm_count as usize * COUNT_BYTES as usize];
            cursor.read_at(&mut buf, COUNTER_BYTES)?;
            for (i, chunk) in buf.chunks_exact(COUNT_BYTES as usize).enumerate() {
                cache.insert(i as DocId + 1, LittleEndian::read_u32(chunk));
            }
        }

        tracing::info!(item_id, prewarmed = cache.len(), "sidecar recovered");

        Ok((
            Self {
                inner: Mutex::new(Inner {
                    file: cursor,
                    cache,
                    write_buffer: Vec::new(),
                    cache_doc_id_size: config.cache_doc_id_size,
                    write_cache_size: config.write_cache_size,
                }),
            },
            item_id,
        ))
    }

    pub fn record(&self, doc_id: DocId, count: u32) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.cache.len() > inner.cache_doc_id_size {
            inner.flush()?;
            inner.evict_quarter();
        }
        if inner.write_buffer.len() >= inner.write_cache_size {
            inner.flush()?;
        }

        inner.cache.insert(doc_id, count);
        inner.write_buffer.push(doc_id);
        Ok(())
    }

    pub fn total_trigrams(&self, doc_id: DocId) -> Result<u32> {
        let mut inner = self.inner.lock();
        if let Some(&count) = inner.cache.get(&doc_id) {
            return Ok(count);
        }

        let offset = COUNTER_BYTES + (doc_id - 1) * COUNT_BYTES;
        let mut buf = [0u8; COUNT_BYTES as usize];
        inner.file.read_at(&mut buf, offset)?;
        let count = LittleEndian::read_u32(&buf);
        inner.cache.insert(doc_id, count);
        Ok(count)
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    pub fn close(self, item_id: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        let mut buf = [0u8; COUNTER_BYTES as usize];
        LittleEndian::write_u64(&mut buf, item_id);
        inner.file.write_at(&buf, 0)?;
        inner.flush()?;
        inner.file.sync_all().context("fsync sidecar file on close")?;
        tracing::info!(item_id, "sidecar closed");
        Ok(())
    }
}

impl Inner {
    fn flush(&mut self) -> Result<()> {
        for doc_id in self.write_buffer.drain(..) {
            let count = *self
                .cache
                .get(&doc_id)
                .expect("every buffered doc_id has a cached count");
            let offset = COUNTER_BYTES + (doc_id - 1) * COUNT_BYTES;
            let mut buf = [0u8; COUNT_BYTES as usize];
            LittleEndian::write_u32(&mut buf, count);
            self.file.write_at(&buf, offset)?;
        }
        Ok(())
    }

    /// Evicts roughly a quarter of the cache (spec §9: "any policy is
    /// acceptable"). Only called right after `flush()`, so nothing evicted
    /// here is still dirty.
    fn evict_quarter(&mut self) {
        let target = self.cache.len() / 4;
        let victims: Vec<DocId> = self.cache.keys().take(target).copied().collect();
        for doc_id in victims {
            self.cache.remove(&doc_id);
        }
    }
}
