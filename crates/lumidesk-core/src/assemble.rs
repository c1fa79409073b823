//! Context assembly: one retrieval call turned into a context block,
//! citations, and a best score.
//!
//! The context and the citations come from the same retriever response and
//! keep the same order, so citation `i` always describes the `i`-th segment
//! of the joined context.

use tracing::debug;

use crate::error::DeskError;
use crate::models::{Category, Citation, RetrievalResult, RetrievedItem};
use crate::policy::ScoreType;
use crate::retriever::Retriever;

/// Separator placed between retrieved texts in the joined context.
pub const SEGMENT_DELIMITER: &str = "\n\n---\n\n";

/// Default quote budget in characters. Large enough that contact addresses
/// embedded in a chunk survive truncation.
pub const DEFAULT_QUOTE_MAX_CHARS: usize = 400;

/// Marker appended to truncated quotes.
pub const ELLIPSIS: &str = "...";

/// Tuning for [`assemble`].
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    /// Character budget for each citation quote.
    pub quote_max_chars: usize,
    /// Direction used to pick the best score.
    pub score_type: ScoreType,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            quote_max_chars: DEFAULT_QUOTE_MAX_CHARS,
            score_type: ScoreType::Distance,
        }
    }
}

/// Retrieve up to `k` items for `query` and assemble a [`RetrievalResult`].
///
/// A category filter is applied only when `category` is not
/// [`Category::Unknown`]. Zero hits yield an empty context, no citations,
/// and `best_score = None`.
///
/// # Errors
///
/// - [`DeskError::EmptyQuery`] when `query` is blank (the retriever is not called).
/// - [`DeskError::InvalidArgument`] when `k == 0`.
/// - [`DeskError::Retrieval`] when the retriever fails.
pub async fn assemble<R: Retriever + ?Sized>(
    retriever: &R,
    query: &str,
    k: usize,
    category: Category,
    options: AssembleOptions,
) -> Result<RetrievalResult, DeskError> {
    if query.trim().is_empty() {
        return Err(DeskError::EmptyQuery);
    }
    if k == 0 {
        return Err(DeskError::InvalidArgument("k must be > 0".to_string()));
    }

    let items = retriever
        .search(query, k, category.as_filter())
        .await
        .map_err(DeskError::Retrieval)?;

    debug!(
        query,
        k,
        category = category.as_str(),
        hits = items.len(),
        "retrieval complete"
    );

    Ok(build_result(&items, options))
}

/// Build a [`RetrievalResult`] from items already in retriever order.
pub fn build_result(items: &[RetrievedItem], options: AssembleOptions) -> RetrievalResult {
    if items.is_empty() {
        return RetrievalResult::default();
    }

    let context = items
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join(SEGMENT_DELIMITER);

    let best_score = options.score_type.best(items.iter().map(|item| item.score));

    let citations = items
        .iter()
        .enumerate()
        .map(|(i, item)| Citation {
            index: i + 1,
            category: item.metadata.category,
            source: item.metadata.source.clone(),
            page: item.metadata.page.map(|p| p + 1),
            quote: make_quote(&item.text, options.quote_max_chars),
            score: Some(item.score),
        })
        .collect();

    RetrievalResult {
        context,
        citations,
        best_score,
    }
}

/// Build a display excerpt: trimmed, line breaks collapsed to spaces, and cut
/// to `max_chars` characters with [`ELLIPSIS`] appended when cut.
///
/// The cut lands on the last whitespace inside the final quarter of the
/// budget when there is one; text without spaces is cut at the character
/// budget. A cut that would split an ASCII token (an email address or URL
/// embedded in CJK text) moves to the start of that token, or past its end
/// when the token opens the quote. Cuts never split a codepoint.
pub fn make_quote(text: &str, max_chars: usize) -> String {
    let flat = text
        .trim()
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ");

    let total = flat.chars().count();
    if total <= max_chars {
        return flat;
    }

    let byte_end = flat
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(flat.len());
    let head = &flat[..byte_end];

    let min_keep = max_chars - max_chars / 4;
    let cut = head
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .filter(|i| head[..*i].chars().count() >= min_keep)
        .last()
        .unwrap_or(head.len());
    let cut = ascii_token_boundary(&flat, cut);

    if cut >= flat.len() {
        return flat;
    }
    format!("{}{}", flat[..cut].trim_end(), ELLIPSIS)
}

/// Move `cut` off the inside of a run of printable ASCII characters.
fn ascii_token_boundary(text: &str, cut: usize) -> usize {
    let inside = text[..cut]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_graphic())
        && text[cut..].chars().next().is_some_and(|c| c.is_ascii_graphic());
    if !inside {
        return cut;
    }

    let start = text[..cut]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_graphic())
        .last()
        .map_or(cut, |(i, _)| i);
    if start > 0 {
        return start;
    }
    text[cut..]
        .find(|c: char| !c.is_ascii_graphic())
        .map_or(text.len(), |offset| cut + offset)
}
