//! Public error taxonomy for the crate boundary (spec §7).
//!
//! Internally, the posting store, sidecar, and header codec use
//! `anyhow::Result` the way `trident`'s own build/index modules do, attaching
//! `.context(...)` at each fallible I/O call site. `Index`'s public methods
//! collapse that into this typed enum instead, since callers embedding the
//! index need to distinguish "fatal, re-open the index" from "programmer
//! error" without downcasting an opaque `anyhow::Error`. `Index` does the
//! collapsing itself (see `index::io_or_other` and `Index::classify`): it
//! downcasts the `anyhow::Error` root cause back to `std::io::Error` where
//! possible, checks `PostingStore::is_poisoned` before anything else, and
//! validates doc ids at the one public entry point that takes one
//! (`Index::total_trigrams`), so all four variants are actually reachable
//! rather than documented dead code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// A read, write, seek, or sync failure on the data, header, or sidecar
    /// file whose root cause is still a plain `std::io::Error` once
    /// unwrapped from its `anyhow` context. Unrecoverable: the caller must
    /// close and re-open.
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A previous `add_item` failed partway through slot allocation, leaving
    /// the header and data file inconsistent. The store refuses further
    /// writes until the process restarts and the index is re-opened.
    #[error("posting store is poisoned by a prior I/O failure; re-open the index")]
    Poisoned,

    /// `doc_id` was `0` or greater than the number of documents inserted so
    /// far. Always a programmer error. Returned by `Index::total_trigrams`;
    /// never surfaced from `query`/`insert`, which only ever operate on doc
    /// ids the facade itself assigned.
    #[error("invalid document id: {0}")]
    InvalidDocId(u64),

    /// Any other unrecoverable failure that isn't an I/O error, a poisoned
    /// store, or an invalid doc id lookup (e.g. a header codec failure
    /// surfaced some other way, or any `anyhow::Error` not rooted in
    /// `std::io::Error`).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
