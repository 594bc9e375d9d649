//! In-memory posting header, persisted as one `bincode`-encoded blob in
//! `<data_file>.hdr`. Field names are pinned with `#[serde(rename = ..)]` to
//! the names the external interface table documents (`Compaction_needed`,
//! `Trigrams`, `Position`, `Items`), the same way `trident`'s `db::key::DBKey`
//! pins its on-disk discriminant values — except here there's no sum type to
//! encode, just two stable-named fields, so a derived struct does the job
//! `bincode` (the pack's standard choice, see `vicaya-index`/`kotadb`) rather
//! than `trident`'s hand-written discriminant codec.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Gram;

/// One run of up-to-`slot_size` document IDs within a trigram's posting chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainEntry {
    #[serde(rename = "Position")]
    pub position: u64,
    #[serde(rename = "Items")]
    pub items: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PostingHeader {
    #[serde(rename = "Compaction_needed")]
    pub compaction_needed: bool,
    #[serde(rename = "Trigrams")]
    pub trigrams: HashMap<Gram, Vec<ChainEntry>>,
}

impl PostingHeader {
    /// Loads the header from `path`. A missing or undecodable file is not an
    /// error (spec §7): it just means a fresh index.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => {
                bincode::deserialize(&bytes).unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "posting header decode failed, starting fresh");
                    Self::default()
                })
            }
            _ => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
