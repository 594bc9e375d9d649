//! Index facade (spec §4.4): owns the document ID counter and routes writes
//! and queries to the `PostingStore` and `DocumentSidecar`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::posting::PostingStore;
use crate::rank::{self, RankedHit};
use crate::sidecar::DocumentSidecar;
use crate::stats::{Counters, IndexStats};
use crate::trigram::trigramize;
use crate::DocId;

/// A persistent trigram fuzzy-search index rooted at a single path `P`.
///
/// Opens (or creates) three files alongside `P`: the posting data file
/// itself, `P.hdr` (posting header), and `P.docs` (document sidecar). See
/// spec §6.
pub struct Index {
    posting: PostingStore,
    sidecar: DocumentSidecar,
    item_id: AtomicU64,
    counters: Arc<Counters>,
}

impl Index {
    /// Opens (creating if absent) the index rooted at `path`, recovering the
    /// document ID counter and all persisted state from its three files.
    pub fn open(path: impl AsRef<Path>, config: IndexConfig) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let counters = Arc::new(Counters::default());

        let posting = PostingStore::open(path, &config, counters.clone()).map_err(io_or_other)?;
        let (sidecar, item_id) =
            DocumentSidecar::open(sidecar_path(path), &config).map_err(io_or_other)?;

        Ok(Self {
            posting,
            sidecar,
            item_id: AtomicU64::new(item_id),
            counters,
        })
    }

    /// Trigramizes `text`, allocates a new document ID, and records the
    /// document in the posting store and sidecar.
    ///
    /// Within a single call, the posting store is published to before the
    /// sidecar is recorded (spec §5); the ID itself is allocated with a
    /// single atomic fetch-add outside any mutex, so concurrent inserts never
    /// race on ID assignment even though their posting-store writes may
    /// interleave arbitrarily.
    pub fn insert(&self, text: &str) -> Result<DocId, IndexError> {
        let doc_id = self.item_id.fetch_add(1, Ordering::SeqCst) + 1;

        let grams = trigramize(text);
        for gram in &grams {
            self.posting.add_item(gram, doc_id).map_err(|e| self.classify(e))?;
        }
        self.sidecar
            .record(doc_id, grams.len() as u32)
            .map_err(io_or_other)?;

        Ok(doc_id)
    }

    /// Returns the top `max_results` documents matching `text`, ranked by
    /// descending trigram-overlap similarity, dropping any result whose
    /// similarity is strictly below `min_similarity` (spec §4.5).
    pub fn query(
        &self,
        text: &str,
        max_results: usize,
        min_similarity: f64,
    ) -> Result<Vec<RankedHit>, IndexError> {
        rank::rank(text, &self.posting, &self.sidecar, max_results, min_similarity)
            .map_err(|e| self.classify(e))
    }

    /// Returns the recorded gram count for `doc_id` (spec §4.3,
    /// `total_trigrams`). `doc_id == 0` or `doc_id` beyond the number of
    /// documents inserted so far is a programmer error (spec §7) and yields
    /// `IndexError::InvalidDocId` rather than touching the sidecar at all.
    pub fn total_trigrams(&self, doc_id: DocId) -> Result<u32, IndexError> {
        if doc_id == 0 || doc_id > self.item_id.load(Ordering::SeqCst) {
            return Err(IndexError::InvalidDocId(doc_id));
        }
        self.sidecar.total_trigrams(doc_id).map_err(io_or_other)
    }

    /// Classifies an `anyhow::Error` surfaced from a posting-store call: a
    /// store poisoned by a prior mid-slot-allocation failure always reports
    /// `Poisoned`, regardless of what this particular call's error looks
    /// like, since the poison outlives the call that caused it.
    fn classify(&self, err: anyhow::Error) -> IndexError {
        if self.posting.is_poisoned() {
            IndexError::Poisoned
        } else {
            io_or_other(err)
        }
    }

    /// A read-only snapshot of index-level counters (not part of the spec's
    /// core contract; see SPEC_FULL.md §4.6.5).
    pub fn stats(&self) -> IndexStats {
        self.counters
            .snapshot(self.item_id.load(Ordering::SeqCst), self.posting.unique_trigram_count())
    }

    /// Flushes and closes the posting store and sidecar, persisting the
    /// posting header and the document ID counter.
    pub fn close(self) -> Result<(), IndexError> {
        let item_id = self.item_id.load(Ordering::SeqCst);
        self.posting.close().map_err(io_or_other)?;
        self.sidecar.close(item_id).map_err(io_or_other)?;
        Ok(())
    }
}

fn sidecar_path(data_path: &Path) -> PathBuf {
    let mut s = data_path.as_os_str().to_owned();
    s.push(".docs");
    PathBuf::from(s)
}

/// Unwraps an internal `anyhow::Error` back down to `IndexError::Io` when its
/// root cause is a plain `std::io::Error`, falling back to `IndexError::Other`
/// otherwise (e.g. a `.context(...)`-only failure with no I/O error beneath
/// it). Used everywhere except posting-store calls, which also need the
/// poison check in `Index::classify`.
fn io_or_other(err: anyhow::Error) -> IndexError {
    match err.downcast::<std::io::Error>() {
        Ok(io_err) => IndexError::Io(io_err),
        Err(err) => IndexError::Other(err),
    }
}
