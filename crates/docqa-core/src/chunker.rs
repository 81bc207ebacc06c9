//! Boundary-aware recursive chunking with a fixed character overlap.
//!
//! Text is cut at the coarsest separator first (section headings), and only
//! pieces that are still too long are cut again at the next separator
//! (paragraphs, lines, words). Separators stay attached to the piece that
//! follows them, so pieces tile the document exactly. Pieces are then merged
//! greedily into bodies of at most `chunk_size - overlap` characters, and each
//! chunk after the first is prefixed with the `overlap` characters that
//! precede its body. A body made of one atomic piece longer than that limit
//! gets only as much prefix as still fits in `chunk_size`. A run without any
//! separator is atomic and may exceed `chunk_size` on its own.
use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.separators.is_empty() || config.separators.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidConfig("separators must be non-empty strings".into()));
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            separators: config.separators.clone(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split a document into ordered chunks. Identical input always yields
    /// identical output.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.raw_text)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                id: format!("{}:{}", document.id, sequence_index),
                document_id: document.id.clone(),
                text,
                source_name: document.source_name.clone(),
                source_path: document.source_path.clone(),
                sequence_index,
            })
            .collect()
    }

    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.spans(text).into_iter().map(|r| text[r].to_string()).collect()
    }

    fn spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![0..text.len()];
        }
        let limit = self.chunk_size - self.overlap;
        let mut pieces = Vec::new();
        self.collect_pieces(text, 0..text.len(), 0, limit, &mut pieces);
        merge_pieces(text, &pieces, limit)
            .into_iter()
            .enumerate()
            .map(|(i, body)| {
                if i == 0 {
                    return body;
                }
                // shrink the prefix when a body longer than `limit` leaves less room
                let room = self.chunk_size.saturating_sub(char_len(&text[body.clone()]));
                back_off(text, body.start, self.overlap.min(room))..body.end
            })
            .collect()
    }

    /// Cut `range` at `separators[level]`, descending only into pieces that
    /// still exceed `limit`.
    fn collect_pieces(&self, text: &str, range: Range<usize>, level: usize, limit: usize, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        if char_len(slice) <= limit {
            out.push(range);
            return;
        }
        let Some(separator) = self.separators.get(level) else {
            out.push(range);
            return;
        };
        let mut start = range.start;
        for (offset, _) in slice.match_indices(separator.as_str()) {
            let at = range.start + offset;
            // a match at the start of the current piece would leave it empty
            if at > start {
                self.collect_pieces(text, start..at, level + 1, limit, out);
                start = at;
            }
        }
        if range.end > start {
            self.collect_pieces(text, start..range.end, level + 1, limit, out);
        }
    }
}

fn merge_pieces(text: &str, pieces: &[Range<usize>], limit: usize) -> Vec<Range<usize>> {
    let mut bodies = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut current_len = 0usize;
    for piece in pieces {
        let piece_len = char_len(&text[piece.clone()]);
        match current.as_mut() {
            Some(body) if current_len + piece_len <= limit => {
                body.end = piece.end;
                current_len += piece_len;
            }
            _ => {
                if let Some(body) = current.take() {
                    bodies.push(body);
                }
                current = Some(piece.clone());
                current_len = piece_len;
            }
        }
    }
    bodies.extend(current);
    bodies
}

/// Byte offset `n` characters before `at`, clamped to the start of `text`.
fn back_off(text: &str, at: usize, n: usize) -> usize {
    if n == 0 {
        return at;
    }
    text[..at].char_indices().rev().take(n).last().map(|(i, _)| i).unwrap_or(at)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_off_counts_characters_not_bytes() {
        let text = "héllo wörld";
        let at = text.find('w').unwrap();
        assert_eq!(&text[back_off(text, at, 3)..at], "lo ");
        assert_eq!(back_off(text, at, 100), 0);
        assert_eq!(back_off(text, at, 0), at);
    }

    #[test]
    fn merge_keeps_pieces_contiguous() {
        let text = "aa bb cc dd";
        let pieces = vec![0..2, 2..5, 5..8, 8..11];
        let bodies = merge_pieces(text, &pieces, 6);
        assert_eq!(bodies, vec![0..5, 5..11]);
    }
}
