//! Query-time aggregation: intersect posting lists, score, keep a bounded
//! top-K (spec §4.5).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use anyhow::Result;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::posting::PostingStore;
use crate::sidecar::DocumentSidecar;
use crate::trigram::trigramize;
use crate::DocId;

/// One scored result from `Index::query`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
    pub doc_id: DocId,
    pub similarity: f64,
}

/// Heap entry ordered by similarity (ties broken by ascending doc_id, so the
/// heap's "smallest" — the one `pop`ped first when we overflow — is the
/// worst-scoring, earliest-inserted candidate kept).
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredId {
    similarity: f64,
    doc_id: DocId,
}

impl Eq for ScoredId {}

impl Ord for ScoredId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.similarity
            .total_cmp(&other.similarity)
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for ScoredId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub fn rank(
    query: &str,
    posting_store: &PostingStore,
    sidecar: &DocumentSidecar,
    max_results: usize,
    min_similarity: f64,
) -> Result<Vec<RankedHit>> {
    let grams = trigramize(query);
    let q = grams.len();
    if q == 0 || max_results == 0 {
        return Ok(Vec::new());
    }

    let mut hits: FxHashMap<DocId, u32> = FxHashMap::default();
    for gram in &grams {
        let posting = posting_store.get_items(gram)?;
        // `get_items` returns the posting list as-stored, which can repeat a
        // doc_id within one gram's list (a document whose text yields that
        // gram more than once). Spec §4.5 requires counting each id at most
        // once per gram.
        for doc_id in posting.iter().copied().unique() {
            *hits.entry(doc_id).or_insert(0) += 1;
        }
    }

    // Min-heap on similarity: `Reverse` turns the BinaryHeap (a max-heap)
    // into one where `peek`/`pop` give the current worst kept candidate, so
    // overflow eviction is an O(log k) `pop` rather than a full re-sort.
    let mut top: BinaryHeap<Reverse<ScoredId>> = BinaryHeap::with_capacity(max_results + 1);

    for (doc_id, count) in hits {
        let count = count as f64;
        let q_f = q as f64;

        // `count / q` alone upper-bounds similarity (the length-penalty term
        // only ever subtracts), so when we already hold `max_results`
        // candidates and this one can't beat the worst of them even with a
        // perfect length match, skip the sidecar lookup entirely.
        if top.len() >= max_results {
            if let Some(Reverse(worst)) = top.peek() {
                if count / q_f <= worst.similarity {
                    continue;
                }
            }
        }

        let t = sidecar.total_trigrams(doc_id)? as f64;
        if t == 0.0 {
            continue;
        }
        let ratio = (q_f / t).min(t / q_f);
        let similarity = (count / q_f) - (1.0 - ratio);

        if similarity < min_similarity {
            continue;
        }

        let candidate = ScoredId { similarity, doc_id };
        if top.len() < max_results {
            top.push(Reverse(candidate));
        } else if let Some(Reverse(worst)) = top.peek() {
            if candidate > *worst {
                top.pop();
                top.push(Reverse(candidate));
            }
        }
    }

    let mut results: Vec<RankedHit> = top
        .into_iter()
        .map(|Reverse(s)| RankedHit {
            doc_id: s.doc_id,
            similarity: s.similarity,
        })
        .collect();
    results.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scored_id_orders_by_similarity_then_doc_id() {
        let low = ScoredId {
            similarity: 0.1,
            doc_id: 5,
        };
        let high = ScoredId {
            similarity: 0.9,
            doc_id: 1,
        };
        assert!(high > low);

        let a = ScoredId {
            similarity: 0.5,
            doc_id: 2,
        };
        let b = ScoredId {
            similarity: 0.5,
            doc_id: 1,
        };
        // equal similarity: lower doc_id should compare greater (kept over
        // a higher doc_id on ties, since eviction pops the heap's minimum).
        assert!(b > a);
    }
}
