//! Overlapping character-window chunker.
//!
//! Splits page text into [`Chunk`]s of at most `chunk_chars` characters.
//! Consecutive chunks share up to `overlap_chars` characters so a sentence
//! cut at a window edge still appears whole in one of them.
//!
//! # Algorithm
//!
//! 1. Open a window of `chunk_chars` characters at the current start.
//! 2. If the window does not reach the end of the text, pull its end back
//!    to the last paragraph break (`\n\n`) in the window's second half;
//!    failing that, the last line break; failing that, the last whitespace.
//!    Text without any break (common in Japanese) is cut at the window size.
//! 3. Emit the trimmed window, then start the next window `overlap_chars`
//!    before the current end (always moving forward by at least one char).
//!
//! Windows are counted in `char`s, so a multi-byte codepoint is never split.
//!
//! # Example
//!
//! ```rust
//! use lumidesk_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", 500, 100);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_index, 0);
//! ```

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One window of page text ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    /// Position within the page, contiguous from 0.
    pub chunk_index: usize,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// Split `text` into overlapping windows.
///
/// Returns an empty vector for whitespace-only text. `overlap_chars` is
/// clamped below `chunk_chars`; a `chunk_chars` of zero is treated as one.
pub fn chunk_text(text: &str, chunk_chars: usize, overlap_chars: usize) -> Vec<Chunk> {
    let chunk_chars = chunk_chars.max(1);
    let overlap = overlap_chars.min(chunk_chars - 1);
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < n {
        let mut end = (start + chunk_chars).min(n);
        if end < n {
            end = boundary_before(&chars, start + chunk_chars / 2, end).unwrap_or(end);
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(make_chunk(chunks.len(), trimmed));
        }

        if end >= n {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Latest split point in `(min_end, end]`, preferring paragraph breaks, then
/// line breaks, then any whitespace. The returned index is just past the
/// separator.
fn boundary_before(chars: &[char], min_end: usize, end: usize) -> Option<usize> {
    let paragraph = |i: usize| i >= 2 && chars[i - 1] == '\n' && chars[i - 2] == '\n';
    let line = |i: usize| chars[i - 1] == '\n';
    let space = |i: usize| chars[i - 1].is_whitespace();

    let candidates = (min_end.max(1) + 1)..=end;
    candidates
        .clone()
        .rev()
        .find(|&i| paragraph(i))
        .or_else(|| candidates.clone().rev().find(|&i| line(i)))
        .or_else(|| candidates.rev().find(|&i| space(i)))
}

fn make_chunk(index: usize, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
