//! Recursive character chunking with page tracking

use std::collections::VecDeque;

use super::parser::PageText;

/// Separators tried in order, coarsest first. The empty separator splits
/// between characters and always applies.
const SEPARATORS: &[&str] = &["\n\n", "\n", ".", " ", ""];

/// A chunk of page text, numbered across the whole document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChunk {
    pub page: u32,
    pub chunk_id: usize,
    pub text: String,
}

/// Splits text into chunks of at most `max_chars` characters, preferring
/// paragraph, then line, then sentence, then word boundaries. Consecutive
/// chunks share up to `overlap` characters.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `overlap` is clamped below `max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        let max_chars = max_chars.max(1);
        Self {
            max_chars,
            overlap: overlap.min(max_chars - 1),
        }
    }

    /// Chunk each page independently; chunks never span pages
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<PageChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for text in self.split(&page.text) {
                chunks.push(PageChunk {
                    page: page.number,
                    chunk_id: chunks.len(),
                    text,
                });
            }
        }
        chunks
    }

    /// Split `text` into trimmed, non-empty chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let index = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(index).copied().unwrap_or("");
        let finer = separators.get(index + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= self.max_chars {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, carrying a tail of at most
    /// `overlap` characters into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.max_chars && !window.is_empty() {
                chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());

                while total > self.overlap || (total + len > self.max_chars && total > 0) {
                    match window.pop_front() {
                        Some((_, front)) => total -= front,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());
        }
        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(800, 200)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
