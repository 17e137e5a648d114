//! Recursive separator chunking with char-based overlap.
//!
//! The text is first cut into pieces that partition it exactly: the coarsest
//! separator present splits a span, and any piece still longer than the body
//! budget `max_size - overlap` is split again with the next separator. An
//! empty separator hard-cuts at the budget. Separators stay attached to the
//! piece they end.
//!
//! Pieces are then merged greedily up to `max_size`. Each chunk after the
//! first starts with the trailing `overlap` chars of its predecessor, taken
//! from the source text by offset, and that prefix counts against
//! `max_size`. Since every piece fits the budget, only an atomic token
//! (no finer separator left) can start a chunk without that prefix.

use std::ops::Range;

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Document};

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Splits one document into ordered chunks. Empty text yields none.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let index = CharIndex::new(&document.raw_text);
        self.spans(&index)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, span)| Chunk {
                source_id: document.source_id.clone(),
                text: index.slice(span.clone()).to_string(),
                sequence_index,
                char_offset: span.start,
            })
            .collect()
    }

    pub fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.chunk(document);
            debug!(source_id = %document.source_id, chunks = chunks.len(), "chunked document");
            all_chunks.extend(chunks);
        }
        all_chunks
    }

    fn spans(&self, index: &CharIndex<'_>) -> Vec<Range<usize>> {
        if index.len() == 0 {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.split_pieces(index, 0..index.len(), &self.config.separators, &mut pieces);
        self.merge(&pieces)
    }

    fn split_pieces(&self, index: &CharIndex<'_>, span: Range<usize>, separators: &[String], out: &mut Vec<Range<usize>>) {
        let budget = self.config.max_size - self.config.overlap;
        if span.len() <= budget {
            out.push(span);
            return;
        }
        let slice = index.slice(span.clone());
        let Some(position) = separators.iter().position(|sep| sep.is_empty() || slice.contains(sep.as_str())) else {
            // nothing finer to cut on
            out.push(span);
            return;
        };
        let separator = separators[position].as_str();
        if separator.is_empty() {
            let mut start = span.start;
            while start < span.end {
                let end = (start + budget).min(span.end);
                out.push(start..end);
                start = end;
            }
            return;
        }

        let finer = &separators[position + 1..];
        let base_byte = index.byte_offset(span.start);
        let mut start = span.start;
        for (byte, matched) in slice.match_indices(separator) {
            let end = index.char_at_byte(base_byte + byte + matched.len());
            if end > start {
                self.split_pieces(index, start..end, finer, out);
                start = end;
            }
        }
        if start < span.end {
            self.split_pieces(index, start..span.end, finer, out);
        }
    }

    fn merge(&self, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let max_size = self.config.max_size;
        let mut chunks: Vec<Range<usize>> = Vec::new();
        let mut current: Option<Range<usize>> = None;
        for piece in pieces {
            if let Some(open) = current.as_mut() {
                if open.len() + piece.len() <= max_size {
                    open.end = piece.end;
                    continue;
                }
                chunks.push(open.clone());
            }
            let mut prefix = chunks.last().map_or(0, |prev| self.config.overlap.min(prev.len()));
            if prefix + piece.len() > max_size {
                // atomic token wider than the budget
                prefix = 0;
            }
            current = Some(piece.start - prefix..piece.end);
        }
        chunks.extend(current);
        chunks
    }
}

/// Char-to-byte offset table over one text.
struct CharIndex<'a> {
    text: &'a str,
    bounds: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let bounds = text.char_indices().map(|(byte, _)| byte).chain(std::iter::once(text.len())).collect();
        Self { text, bounds }
    }

    fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.bounds[char_pos]
    }

    fn char_at_byte(&self, byte: usize) -> usize {
        self.bounds.binary_search(&byte).unwrap_or_else(|insert_at| insert_at)
    }

    fn slice(&self, span: Range<usize>) -> &'a str {
        &self.text[self.bounds[span.start]..self.bounds[span.end]]
    }
}
