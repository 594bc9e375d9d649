//! Persistent trigram-based fuzzy search index over short strings.
//!
//! See `Index` for the public entry point: `open`, `insert`, `query`, `close`.

pub mod config;
pub mod error;
mod ioutil;
pub mod posting;
pub mod rank;
pub mod sidecar;
pub mod stats;
pub mod trigram;

mod index;

pub use config::IndexConfig;
pub use error::IndexError;
pub use index::Index;
pub use rank::RankedHit;
pub use stats::IndexStats;

/// Monotonically assigned document identifier. `0` is reserved as "unassigned".
pub type DocId = u64;

/// A single gram produced by the trigramizer: 1 to 3 lowercased Unicode codepoints.
pub type Gram = String;
