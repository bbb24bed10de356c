//! Tag aggregation: counts, recency ranking, and fuzzy name search.

use nucleo_matcher::{pattern::Pattern, Matcher};

use crate::shard::Shard;

/// One distinct tag with its usage bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub tag: String,
    pub shard_count: usize,
    /// Most recent view across the shards carrying this tag.
    pub last_viewed_at: Option<u64>,
    /// Newest creation across the shards carrying this tag.
    pub newest_created_at: u64,
}

/// Aggregate the distinct tags across a set of shards.
pub fn summarize_tags(shards: &[Shard]) -> Vec<TagSummary> {
    let mut summaries: Vec<TagSummary> = Vec::new();
    for shard in shards {
        for tag in &shard.tags {
            match summaries.iter_mut().find(|s| &s.tag == tag) {
                Some(summary) => {
                    summary.shard_count += 1;
                    summary.last_viewed_at = summary.last_viewed_at.max(shard.last_viewed_at);
                    summary.newest_created_at = summary.newest_created_at.max(shard.created_at);
                }
                None => summaries.push(TagSummary {
                    tag: tag.clone(),
                    shard_count: 1,
                    last_viewed_at: shard.last_viewed_at,
                    newest_created_at: shard.created_at,
                }),
            }
        }
    }
    summaries.sort_by(|a, b| a.tag.cmp(&b.tag));
    summaries
}

/// Order tags most-recently-viewed first; never-viewed tags rank below
/// viewed ones and fall back to creation recency, then name.
pub fn rank_by_recency(mut summaries: Vec<TagSummary>) -> Vec<TagSummary> {
    summaries.sort_by(|a, b| {
        b.last_viewed_at
            .unwrap_or(0)
            .cmp(&a.last_viewed_at.unwrap_or(0))
            .then_with(|| b.newest_created_at.cmp(&a.newest_created_at))
            .then_with(|| b.shard_count.cmp(&a.shard_count))
            .then_with(|| a.tag.cmp(&b.tag))
    });
    summaries
}

/// Fuzzy search tag names. Returns `(summary, score)` pairs sorted by score
/// descending, scores normalized to the best hit, truncated to `limit`.
pub fn fuzzy_search(
    query: &str,
    summaries: &[TagSummary],
    limit: usize,
) -> Vec<(TagSummary, f32)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = Pattern::parse(
        query,
        nucleo_matcher::pattern::CaseMatching::Smart,
        nucleo_matcher::pattern::Normalization::Smart,
    );

    let mut scored: Vec<(usize, u32)> = summaries
        .iter()
        .enumerate()
        .filter_map(|(idx, summary)| {
            let haystack = nucleo_matcher::Utf32String::from(summary.tag.as_str());
            pattern
                .score(haystack.slice(..), &mut matcher)
                .map(|score| (idx, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| summaries[a.0].tag.cmp(&summaries[b.0].tag)));
    scored.truncate(limit);

    let max_score = scored.first().map(|(_, s)| *s as f32).unwrap_or(1.0);
    scored
        .into_iter()
        .map(|(idx, score)| {
            let normalized = if max_score > 0.0 {
                score as f32 / max_score
            } else {
                0.0
            };
            (summaries[idx].clone(), normalized)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::Shard;
    use pretty_assertions::assert_eq;

    fn shard_with(file: &str, tags: &[&str], last_viewed_at: Option<u64>) -> Shard {
        let mut shard = Shard::new(
            file.to_string(),
            format!("def {file}("),
            "return".to_string(),
            "content".to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
            None,
            None,
            1,
            1,
            0,
        )
        .unwrap();
        shard.last_viewed_at = last_viewed_at;
        shard
    }

    #[test]
    fn summarize_counts_shards_per_tag() {
        let shards = vec![
            shard_with("a", &["auth", "api"], None),
            shard_with("b", &["auth", "middleware"], None),
            shard_with("c", &["upload", "api"], None),
        ];
        let summaries = summarize_tags(&shards);
        let counts: Vec<(&str, usize)> = summaries
            .iter()
            .map(|s| (s.tag.as_str(), s.shard_count))
            .collect();
        assert_eq!(
            counts,
            vec![("api", 2), ("auth", 2), ("middleware", 1), ("upload", 1)]
        );
    }

    #[test]
    fn recency_ranking_prefers_recently_viewed() {
        let mut old = shard_with("a", &["old-tag"], Some(1_000));
        old.created_at = 1;
        let mut recent = shard_with("b", &["recent-tag"], Some(2_000));
        recent.created_at = 1;
        let ranked = rank_by_recency(summarize_tags(&[old, recent]));
        assert_eq!(ranked[0].tag, "recent-tag");
        assert_eq!(ranked[1].tag, "old-tag");
    }

    #[test]
    fn fuzzy_search_finds_exact_and_typo_matches() {
        let shards = vec![
            shard_with("a", &["auth", "api"], None),
            shard_with("b", &["authentication"], None),
            shard_with("c", &["upload"], None),
        ];
        let summaries = summarize_tags(&shards);

        let hits = fuzzy_search("auth", &summaries, 20);
        assert!(hits.iter().any(|(s, _)| s.tag == "auth"));
        assert!(hits.iter().any(|(s, _)| s.tag == "authentication"));
        assert!(!hits.iter().any(|(s, _)| s.tag == "upload"));

        // Partial query still finds both.
        let hits = fuzzy_search("aut", &summaries, 20);
        assert!(hits.len() >= 2);

        // No match.
        assert!(fuzzy_search("nonexistent", &summaries, 20).is_empty());
    }

    #[test]
    fn fuzzy_search_respects_the_limit() {
        let shards: Vec<Shard> = (0..30)
            .map(|i| shard_with(&format!("f{i}"), &[&format!("tag-{i}")], None))
            .collect();
        let summaries = summarize_tags(&shards);
        let hits = fuzzy_search("tag", &summaries, 20);
        assert_eq!(hits.len(), 20);
    }
}
