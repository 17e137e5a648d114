//! Domain types shared by the chunker, the indexer and the query path.

use serde::{Deserialize, Serialize};

/// Fixed answer when retrieval finds nothing to ground on.
pub const NO_EVIDENCE_ANSWER: &str = "no relevant documents found";

/// Fixed answer for every generation failure kind.
pub const GENERATION_FAILED_ANSWER: &str = "an error occurred while generating the answer";

/// A source document as handed over by the acquisition step.
///
/// `source_id` is the origin locator (URL or file path). The aliases accept
/// stage files written with `source`/`content` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "source")]
    pub source_id: String,
    #[serde(alias = "content")]
    pub raw_text: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), raw_text: raw_text.into() }
    }
}

/// A bounded slice of one document's text.
///
/// - `sequence_index`: position within the parent document, starting at 0
/// - `char_offset`: offset of `text` in the document text, counted in chars
///
/// Every chunk except the first of its document may start with an overlap
/// prefix copied from the tail of its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(alias = "source")]
    pub source_id: String,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default)]
    pub sequence_index: usize,
    #[serde(default)]
    pub char_offset: usize,
}

impl Chunk {
    /// Length of `text` in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A chunk together with its embedding, as written to the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One k-NN result. Higher `score` is more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// The outcome of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub grounded: bool,
}

impl Answer {
    pub fn grounded(text: impl Into<String>) -> Self {
        Self { text: text.into(), grounded: true }
    }

    pub fn no_evidence() -> Self {
        Self { text: NO_EVIDENCE_ANSWER.to_string(), grounded: false }
    }

    pub fn generation_failed() -> Self {
        Self { text: GENERATION_FAILED_ANSWER.to_string(), grounded: false }
    }
}

/// Summary of one index rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub dimension: usize,
    pub indexed: usize,
    pub embedding_failures: usize,
    pub write_failures: usize,
}

/// Request handed to the generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub context: String,
    pub query: String,
}

impl GenerationRequest {
    /// User turn sent next to the system instruction.
    pub fn user_message(&self) -> String {
        format!("\n[Official documents]\n{}\n---\n[Question]\n{}\n", self.context, self.query)
    }
}
