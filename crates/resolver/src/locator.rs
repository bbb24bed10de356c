//! Snippet locator: find the best occurrence of a captured `from`/`to`
//! anchor pair inside a (possibly changed) file body.
//!
//! Exact matches win. When an anchor has no exact occurrence the locator
//! falls back to sliding approximate windows scored with the similarity
//! measure; a lost start anchor is a hard failure, a lost end anchor
//! truncates the span at end-of-file.

use crate::similarity::similarity;

/// Minimum acceptable similarity for an approximate anchor window.
pub const MIN_ANCHOR_SCORE: f64 = 0.3;

/// Window length tolerance for approximate matching (fraction of the
/// anchor length, applied in both directions).
pub const WINDOW_TOLERANCE: f64 = 0.2;

/// Exact occurrences considered per anchor before giving up on ranking.
const MAX_OCCURRENCES: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpan {
    /// The span text, from the start of the matched `from` anchor through
    /// the end of the matched `to` anchor (or end of file when truncated).
    pub text: String,
    /// Byte offset of the span start.
    pub start: usize,
    /// Byte offset one past the span end.
    pub end: usize,
    /// 1-indexed first line of the span.
    pub start_line: u32,
    /// 1-indexed last line of the span, inclusive.
    pub end_line: u32,
    /// The end anchor was not found at any acceptable confidence; the span
    /// runs to end-of-file instead.
    pub truncated_end: bool,
    /// The start anchor matched approximately rather than exactly.
    pub approximate_start: bool,
    /// The end anchor matched approximately rather than exactly.
    pub approximate_end: bool,
}

impl ResolvedSpan {
    /// At least one anchor matched approximately rather than exactly.
    pub fn approximate(&self) -> bool {
        self.approximate_start || self.approximate_end
    }

    /// Both anchors matched exactly and the span was not truncated.
    pub fn exact(&self) -> bool {
        !self.approximate_start && !self.approximate_end && !self.truncated_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    /// The start anchor has no exact occurrence and no approximate window
    /// reached [`MIN_ANCHOR_SCORE`]. Distinct from a successful resolution
    /// with heavy drift.
    #[error("start anchor not found at any acceptable confidence")]
    AnchorNotFound,
}

/// Resolve `from_text`/`to_text` against the current file body.
///
/// `last_start` is the span's last known byte offset, used only to break
/// ties between equally good start candidates.
pub fn locate(
    text: &str,
    from_text: &str,
    to_text: &str,
    last_start: Option<usize>,
) -> Result<ResolvedSpan, LocateError> {
    if from_text.is_empty() || text.is_empty() {
        return Err(LocateError::AnchorNotFound);
    }

    let start = match locate_start(text, from_text, to_text, last_start) {
        Some(start) => start,
        None => return Err(LocateError::AnchorNotFound),
    };

    let search_from = start.match_end.min(text.len());
    let end = locate_end(text, to_text, search_from);

    let span_start = start.offset;
    let span_end = end.offset.max(search_from);
    let span_text = text[span_start..span_end].to_string();
    let (start_line, end_line) = line_range(text, span_start, span_end);

    Ok(ResolvedSpan {
        text: span_text,
        start: span_start,
        end: span_end,
        start_line,
        end_line,
        truncated_end: end.truncated,
        approximate_start: start.approximate,
        approximate_end: end.approximate,
    })
}

struct StartMatch {
    offset: usize,
    match_end: usize,
    approximate: bool,
}

struct EndMatch {
    offset: usize,
    truncated: bool,
    approximate: bool,
}

/// Step 1/2 of the algorithm: exact occurrences of the start anchor ranked
/// by the nearest following end anchor, then the approximate fallback.
fn locate_start(
    text: &str,
    from_text: &str,
    to_text: &str,
    last_start: Option<usize>,
) -> Option<StartMatch> {
    let occurrences: Vec<usize> = text
        .match_indices(from_text)
        .map(|(offset, _)| offset)
        .take(MAX_OCCURRENCES)
        .collect();

    if !occurrences.is_empty() {
        let offset = pick_start_occurrence(text, &occurrences, from_text, to_text, last_start);
        return Some(StartMatch {
            offset,
            match_end: offset + from_text.len(),
            approximate: false,
        });
    }

    let (offset, window_end, score) = best_window(text, from_text, 0, last_start)?;
    if score < MIN_ANCHOR_SCORE {
        return None;
    }
    log::debug!("start anchor matched approximately at {offset} (score {score:.3})");
    Some(StartMatch {
        offset,
        match_end: window_end,
        approximate: true,
    })
}

/// Prefer the occurrence whose nearest following exact end anchor encloses
/// the smallest span; break remaining ties by distance to the last known
/// offset, else keep the first occurrence.
fn pick_start_occurrence(
    text: &str,
    occurrences: &[usize],
    from_text: &str,
    to_text: &str,
    last_start: Option<usize>,
) -> usize {
    let mut best: Option<(usize, (bool, usize, usize))> = None;

    for &offset in occurrences {
        let enclosed = if to_text.is_empty() {
            None
        } else {
            text[offset + from_text.len()..]
                .find(to_text)
                .map(|relative| from_text.len() + relative + to_text.len())
        };
        let distance = last_start
            .map(|last| offset.abs_diff(last))
            .unwrap_or(usize::MAX);
        // Rank: has an end anchor first, then smallest enclosed span, then
        // closest to the last known offset. Strict comparison keeps the
        // first occurrence on full ties.
        let rank = (enclosed.is_none(), enclosed.unwrap_or(usize::MAX), distance);

        match &best {
            Some((_, best_rank)) if rank >= *best_rank => {}
            _ => best = Some((offset, rank)),
        }
    }

    best.map(|(offset, _)| offset).unwrap_or(occurrences[0])
}

/// Step 3/4: locate the end anchor in the remainder of the file, falling
/// back to approximate windows, then to end-of-file truncation.
fn locate_end(text: &str, to_text: &str, search_from: usize) -> EndMatch {
    if to_text.is_empty() {
        return EndMatch {
            offset: text.len(),
            truncated: true,
            approximate: false,
        };
    }

    if let Some(relative) = text[search_from..].find(to_text) {
        return EndMatch {
            offset: search_from + relative + to_text.len(),
            truncated: false,
            approximate: false,
        };
    }

    if let Some((_, window_end, score)) = best_window(text, to_text, search_from, None) {
        if score >= MIN_ANCHOR_SCORE {
            return EndMatch {
                offset: window_end,
                truncated: false,
                approximate: true,
            };
        }
    }

    // The start anchor is more authoritative than the end anchor: a lost
    // end truncates gracefully instead of failing the resolution.
    EndMatch {
        offset: text.len(),
        truncated: true,
        approximate: false,
    }
}

/// Slide approximate windows across the text and return the best-scoring
/// one as `(start, end, score)`.
///
/// Anchors are line-shaped in practice, so candidate windows begin at line
/// starts, with three widths spanning the ±[`WINDOW_TOLERANCE`] band.
fn best_window(
    text: &str,
    anchor: &str,
    search_from: usize,
    last_start: Option<usize>,
) -> Option<(usize, usize, f64)> {
    let anchor_len = anchor.len();
    let widths = window_widths(anchor_len);

    let mut best: Option<(usize, usize, f64)> = None;
    for line_start in line_starts(text, search_from) {
        for &width in &widths {
            let end = clamp_to_char_boundary(text, (line_start + width).min(text.len()));
            if end <= line_start {
                continue;
            }
            let score = similarity(anchor, &text[line_start..end]);
            let better = match best {
                None => true,
                Some((best_start, _, best_score)) => {
                    score > best_score
                        || (score == best_score
                            && closer(line_start, best_start, last_start))
                }
            };
            if better {
                best = Some((line_start, end, score));
            }
        }
    }
    best
}

fn window_widths(anchor_len: usize) -> [usize; 3] {
    let tolerance = ((anchor_len as f64) * WINDOW_TOLERANCE).round() as usize;
    [
        anchor_len.saturating_sub(tolerance).max(1),
        anchor_len.max(1),
        anchor_len + tolerance,
    ]
}

fn closer(candidate: usize, incumbent: usize, last_start: Option<usize>) -> bool {
    match last_start {
        Some(last) => candidate.abs_diff(last) < incumbent.abs_diff(last),
        None => false,
    }
}

/// Byte offsets of line starts at or after `from`.
fn line_starts(text: &str, from: usize) -> Vec<usize> {
    let mut starts = Vec::new();
    if from == 0 {
        starts.push(0);
    }
    for (idx, byte) in text.as_bytes().iter().enumerate() {
        if *byte == b'\n' && idx + 1 < text.len() && idx + 1 >= from {
            starts.push(idx + 1);
        }
    }
    if starts.is_empty() && from < text.len() {
        starts.push(clamp_to_char_boundary(text, from));
    }
    starts
}

fn clamp_to_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// 1-indexed inclusive line range for a byte span.
fn line_range(text: &str, start: usize, end: usize) -> (u32, u32) {
    let start_line = 1 + count_newlines(&text.as_bytes()[..start]);
    let last = end.saturating_sub(1).max(start);
    let end_line = 1 + count_newlines(&text.as_bytes()[..last.min(text.len())]);
    (start_line, end_line)
}

fn count_newlines(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|b| **b == b'\n').count() as u32
}
