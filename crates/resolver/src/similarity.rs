//! Similarity scoring between a captured span and its re-resolved form.
//!
//! The score is the only signal the lifecycle engine consumes, so it has to
//! be monotonic: more character-level edits inside the span can never raise
//! the score. The measure is a normalized matching-blocks ratio: recursively
//! find the longest common substring, match the pieces on either side of it,
//! and score `2 * matched / (len_a + len_b)`.

/// Character-DP ceiling. Above `len_a * len_b` products of this size the
/// scorer switches to line-level matching with the same ratio formula.
const CHAR_DP_LIMIT: usize = 16_000_000;

/// Compute a similarity score in `[0, 1]` between the originally captured
/// span and the currently resolved span.
///
/// - `1.0` means byte-identical,
/// - `0.99` means whitespace-only drift,
/// - `0.0` means no overlap (or an empty side).
///
/// Comparison is insensitive to leading/trailing whitespace per line and to
/// blank lines, but sensitive to internal structural changes.
pub fn similarity(original: &str, current: &str) -> f64 {
    if original == current {
        return 1.0;
    }
    if original.is_empty() || current.is_empty() {
        return 0.0;
    }

    let norm_a = normalize(original);
    let norm_b = normalize(current);

    if norm_a == norm_b {
        return 0.99;
    }
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }

    round3(match_ratio(&norm_a, &norm_b))
}

/// `2 * matched / (len_a + len_b)` over the normalized text.
fn match_ratio(a: &str, b: &str) -> f64 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();

    if chars_a
        .len()
        .checked_mul(chars_b.len())
        .is_some_and(|product| product <= CHAR_DP_LIMIT)
    {
        let matched = matched_len(&chars_a, &chars_b);
        return 2.0 * matched as f64 / (chars_a.len() + chars_b.len()) as f64;
    }

    // Large spans: match whole lines instead of characters to keep the
    // scan bounded.
    let lines_a: Vec<&str> = a.lines().collect();
    let lines_b: Vec<&str> = b.lines().collect();
    let matched = matched_len(&lines_a, &lines_b);
    2.0 * matched as f64 / (lines_a.len() + lines_b.len()) as f64
}

/// Total length of recursively matched common blocks: take the longest
/// common substring, then match the regions left and right of it.
fn matched_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        if a_lo >= a_hi || b_lo >= b_hi {
            continue;
        }
        let (i, j, len) = longest_match(&a[a_lo..a_hi], &b[b_lo..b_hi]);
        if len == 0 {
            continue;
        }
        total += len;
        let (i, j) = (a_lo + i, b_lo + j);
        pending.push((a_lo, i, b_lo, j));
        pending.push((i + len, a_hi, j + len, b_hi));
    }
    total
}

/// Longest common substring as `(start_a, start_b, len)`, earliest match
/// winning ties. Two-row DP.
fn longest_match<T: PartialEq>(a: &[T], b: &[T]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        for (j, item_b) in b.iter().enumerate() {
            row[j + 1] = if item_a == item_b { prev[j] + 1 } else { 0 };
            if row[j + 1] > best.2 {
                best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

/// Trim each line and drop blank lines before comparison.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }
    out
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
