//! Document chunking.
//!
//! [`RecursiveChunker`] splits text on the highest-priority separator that
//! occurs in it (paragraph break, line break, sentence end, space), merges
//! the pieces back into chunks of at most `chunk_size` characters with up to
//! `chunk_overlap` characters shared between neighbours, and recurses with
//! the next separator into any piece that is still too large. The empty
//! separator is a hard cut between characters.
//!
//! Separators stay attached to the piece that precedes them, so every chunk
//! is an exact substring of the input and the chunks cover it without gaps.

use std::collections::VecDeque;
use std::ops::Range;

use crate::config::RagConfig;

/// Separators tried in priority order. `""` cuts between characters.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A strategy for splitting document text into passages.
pub trait Chunker: Send + Sync {
    /// Split text into ordered, non-empty chunks.
    ///
    /// Returns an empty `Vec` for empty input.
    fn split_text(&self, text: &str) -> Vec<String>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Sizes are measured in characters (Unicode scalar values), never bytes.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.split_text(&text);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separators.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: maximum number of characters shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker using the sizes from a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list. Leave out `""` to forbid hard cuts, in
    /// which case a piece with no remaining separator is emitted whole even
    /// if it exceeds `chunk_size`.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into byte ranges of the input, in order.
    ///
    /// Consecutive ranges either touch or overlap; the first starts at 0 and
    /// the last ends at `text.len()`.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        let mut spans = Vec::new();
        self.split_range(text, 0..text.len(), &separators, &mut spans);
        spans
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[&str],
        out: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[range.clone()];
        if slice.chars().count() <= self.chunk_size {
            out.push(range);
            return;
        }

        let Some(position) = separators.iter().position(|sep| sep.is_empty() || slice.contains(sep))
        else {
            // Unsplittable unit larger than chunk_size.
            out.push(range);
            return;
        };
        let separator = separators[position];
        let remaining = &separators[position + 1..];

        let pieces: Vec<Range<usize>> = if separator.is_empty() {
            slice
                .char_indices()
                .map(|(i, c)| range.start + i..range.start + i + c.len_utf8())
                .collect()
        } else {
            split_keeping_separator(slice, separator)
                .into_iter()
                .map(|r| range.start + r.start..range.start + r.end)
                .collect()
        };

        let mut pending: Vec<(Range<usize>, usize)> = Vec::new();
        for piece in pieces {
            let len = text[piece.clone()].chars().count();
            if len <= self.chunk_size {
                pending.push((piece, len));
                continue;
            }

            self.merge(&pending, out);
            pending.clear();

            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_range(text, piece, remaining, out);
            }
        }
        self.merge(&pending, out);
    }

    /// Merge contiguous pieces into chunks of at most `chunk_size` characters,
    /// carrying up to `chunk_overlap` characters of trailing pieces into the
    /// next chunk.
    fn merge(&self, pieces: &[(Range<usize>, usize)], out: &mut Vec<Range<usize>>) {
        let mut window: VecDeque<&(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0;

        for item in pieces {
            let len = item.1;
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, popped)) => total -= popped,
                        None => break,
                    }
                }
            }
            window.push_back(item);
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| text[span].to_string()).collect()
    }
}

fn window_span(window: &VecDeque<&(Range<usize>, usize)>) -> Range<usize> {
    let start = window.front().map_or(0, |(r, _)| r.start);
    let end = window.back().map_or(start, |(r, _)| r.end);
    start..end
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(start..end);
        start = end;
    }

    if start < text.len() {
        result.push(start..text.len());
    }

    result
}
