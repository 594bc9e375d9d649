//! Persistent `trigram -> posting chain` store: one data file of fixed-size
//! slots plus a header file, fronted by a byte-budgeted LRU (spec §4.2).

mod cache;
mod header;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;

use crate::config::IndexConfig;
use crate::ioutil::FileCursor;
use crate::stats::Counters;
use crate::DocId;

use cache::PostingCache;
use header::{ChainEntry, PostingHeader};

const ID_BYTES: u64 = 8;

pub struct PostingStore {
    inner: Mutex<Inner>,
    hdr_path: PathBuf,
    counters: Arc<Counters>,
}

struct Inner {
    data: FileCursor,
    next_offset: u64,
    header: PostingHeader,
    cache: PostingCache,
    slot_size: u64,
    poisoned: bool,
}

impl PostingStore {
    pub fn open(
        path: impl AsRef<Path>,
        config: &IndexConfig,
        counters: Arc<Counters>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .with_context(|| format!("opening posting data file {path:?}"))?;
        let data = FileCursor::new(file);
        let next_offset = data.len().context("stat posting data file")?;

        let hdr_path = header_path(path);
        let header = PostingHeader::load(&hdr_path);
        tracing::info!(
            trigrams = header.trigrams.len(),
            data_bytes = next_offset,
            "posting store recovered"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                data,
                next_offset,
                header,
                cache: PostingCache::new(config.cache_size_bytes),
                slot_size: config.slot_size as u64,
                poisoned: false,
            }),
            hdr_path,
            counters,
        })
    }

    /// Appends `doc_id` to `gram`'s posting chain.
    pub fn add_item(&self, gram: &str, doc_id: DocId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_poisoned()?;
        let result = inner.add_item(gram, doc_id);
        if result.is_err() {
            inner.poisoned = true;
        }
        result
    }

    /// Returns the full concatenated posting for `gram`, or empty if absent.
    pub fn get_items(&self, gram: &str) -> Result<Arc<Vec<DocId>>> {
        let mut inner = self.inner.lock();
        inner.check_poisoned()?;
        let (items, was_cached) = inner.get_items(gram)?;
        if was_cached {
            self.counters.record_cache_hit();
        } else {
            self.counters.record_cache_miss();
        }
        Ok(items)
    }

    pub fn unique_trigram_count(&self) -> usize {
        self.inner.lock().header.trigrams.len()
    }

    pub fn is_poisoned(&self) -> bool {
        self.inner.lock().poisoned
    }

    /// Flushes the data file and persists the header. `fsync` runs before the
    /// header write so the header never references offsets the data file
    /// doesn't actually contain yet (spec §4.2, "sync discipline").
    pub fn close(self) -> Result<()> {
        let inner = self.inner.into_inner();
        inner
            .data
            .sync_all()
            .context("fsync posting data file on close")?;
        inner
            .header
            .save(&self.hdr_path)
            .context("persist posting header on close")?;
        tracing::info!(trigrams = inner.header.trigrams.len(), "posting store closed");
        Ok(())
    }
}

impl Inner {
    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            bail!("posting store poisoned by a prior I/O failure; re-open the index");
        }
        Ok(())
    }

    fn allocate_slot(&mut self, doc_id: DocId) -> Result<ChainEntry> {
        let offset = self.next_offset;
        let mut buf = [0u8; ID_BYTES as usize];
        LittleEndian::write_u64(&mut buf, doc_id);
        self.data.write_at(&buf, offset)?;

        let slot_bytes = self.slot_size * ID_BYTES;
        if slot_bytes > ID_BYTES {
            // Reserve the rest of the slot by writing its last byte: on a
            // normal filesystem this leaves a zero-filled hole between the
            // first id and here, which is exactly the "extend the file and
            // zero-pad" step spec'd for slot allocation, in a single write.
            self.data.write_at(&[0u8], offset + slot_bytes - 1)?;
        }

        self.next_offset = offset + slot_bytes;
        Ok(ChainEntry {
            position: offset,
            items: 1,
        })
    }

    fn add_item(&mut self, gram: &str, doc_id: DocId) -> Result<()> {
        self.cache.invalidate(gram);

        let needs_new_slot = match self.header.trigrams.get(gram) {
            None => true,
            Some(chain) => chain
                .last()
                .map(|entry| entry.items >= self.slot_size)
                .unwrap_or(true),
        };

        if needs_new_slot {
            let entry = self.allocate_slot(doc_id)?;
            self.header
                .trigrams
                .entry(gram.to_string())
                .or_default()
                .push(entry);
        } else {
            let chain = self
                .header
                .trigrams
                .get_mut(gram)
                .expect("checked above: chain exists and its last slot has room");
            let last = chain
                .last_mut()
                .expect("checked above: chain is non-empty");
            let write_offset = last.position + last.items * ID_BYTES;
            let mut buf = [0u8; ID_BYTES as usize];
            LittleEndian::write_u64(&mut buf, doc_id);
            self.data.write_at(&buf, write_offset)?;
            last.items += 1;
        }

        Ok(())
    }

    /// Returns the posting list and whether it was served from cache.
    fn get_items(&mut self, gram: &str) -> Result<(Arc<Vec<DocId>>, bool)> {
        if let Some(cached) = self.cache.get(gram) {
            return Ok((cached, true));
        }

        let chain = match self.header.trigrams.get(gram) {
            Some(chain) => chain.clone(),
            None => return Ok((Arc::new(Vec::new()), false)),
        };

        let mut ids = Vec::with_capacity(chain.iter().map(|e| e.items as usize).sum());
        let mut buf = Vec::new();
        for entry in &chain {
            let byte_len = entry.items as usize * ID_BYTES as usize;
            buf.clear();
            buf.resize(byte_len, 0);
            self.data.read_at(&mut buf, entry.position)?;
            ids.extend(buf.chunks_exact(ID_BYTES as usize).map(LittleEndian::read_u64));
        }

        let ids = Arc::new(ids);
        self.cache.insert(gram.to_string(), ids.clone());
        Ok((ids, false))
    }
}

fn header_path(data_path: &Path) -> PathBuf {
    let mut s = data_path.as_os_str().to_owned();
    s.push(".hdr");
    PathBuf::from(s)
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path, config: &IndexConfig) -> PostingStore {
        PostingStore::open(dir.join("postings"), config, Arc::new(Counters::default())).unwrap()
    }

    #[test]
    fn add_then_get_single_item() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default();
        let store = store(dir.path(), &config);

        store.add_item("abc", 1).unwrap();
        assert_eq!(*store.get_items("abc").unwrap(), vec![1]);
    }

    #[test]
    fn cache_invalidated_on_write() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default();
        let store = store(dir.path(), &config);

        store.add_item("abc", 1).unwrap();
        let _ = store.get_items("abc").unwrap(); // populates cache
        store.add_item("abc", 2).unwrap(); // must invalidate
        assert_eq!(*store.get_items("abc").unwrap(), vec![1, 2]);
    }

    #[test]
    fn unknown_trigram_returns_empty() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default();
        let store = store(dir.path(), &config);
        assert!(store.get_items("zzz").unwrap().is_empty());
    }

    #[test]
    fn slot_rollover_creates_a_second_slot() {
        let dir = tempdir().unwrap();
        let config = IndexConfig {
            slot_size: 4,
            ..IndexConfig::default()
        };
        let store = store(dir.path(), &config);

        let ids: Vec<DocId> = (1..=9).collect();
        for &id in &ids {
            store.add_item("xyz", id).unwrap();
        }

        assert_eq!(*store.get_items("xyz").unwrap(), ids);
        let chain_len = store.inner.lock().header.trigrams["xyz"].len();
        // 9 ids at slot_size=4 -> slots of 4, 4, 1
        assert_eq!(chain_len, 3);
    }

    #[test]
    fn poisoned_store_refuses_further_writes_and_reads() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default();
        let store = store(dir.path(), &config);

        store.add_item("abc", 1).unwrap();
        store.inner.lock().poisoned = true;
        assert!(store.is_poisoned());

        assert!(store.add_item("abc", 2).is_err());
        assert!(store.get_items("abc").is_err());
    }

    #[test]
    fn persists_across_close_and_reopen() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default();
        let path = dir.path().join("postings");

        let store = PostingStore::open(&path, &config, Arc::new(Counters::default())).unwrap();
        store.add_item("abc", 1).unwrap();
        store.add_item("abc", 2).unwrap();
        store.close().unwrap();

        let reopened =
            PostingStore::open(&path, &config, Arc::new(Counters::default())).unwrap();
        assert_eq!(*reopened.get_items("abc").unwrap(), vec![1, 2]);
    }
}
