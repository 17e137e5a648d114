//! Vector store backends.
//!
//! [`LanceVectorStore`] persists one named index as a LanceDB table and runs
//! exact cosine k-NN over it. [`InMemoryVectorStore`] keeps the same contract
//! in process for tests and throwaway runs.

pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::LanceVectorStore;
pub use memory::InMemoryVectorStore;

use std::cmp::Ordering;

use docqa_core::types::RetrievalHit;

/// Orders candidates by descending score, then ascending insertion ordinal,
/// and keeps the first `top_k`. NaN scores sort last.
pub(crate) fn rank(mut candidates: Vec<(i64, RetrievalHit)>, top_k: usize) -> Vec<RetrievalHit> {
    candidates.sort_by(|(oa, a), (ob, b)| {
        let sa = if a.score.is_nan() { f32::NEG_INFINITY } else { a.score };
        let sb = if b.score.is_nan() { f32::NEG_INFINITY } else { b.score };
        sb.partial_cmp(&sa).unwrap_or(Ordering::Equal).then(oa.cmp(ob))
    });
    candidates.into_iter().take(top_k).map(|(_, hit)| hit).collect()
}
