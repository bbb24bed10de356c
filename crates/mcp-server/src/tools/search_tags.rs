//! `search_tags`: fuzzy search over distinct tag names.

use memshard_store::{fuzzy_search, summarize_tags, ShardStore};

use super::schemas::tags::{SearchTagsRequest, SearchTagsResult, TagSearchEntry, MAX_TAG_RESULTS};

pub(super) fn compute_search_tags_result(
    store: &ShardStore,
    request: &SearchTagsRequest,
) -> Result<SearchTagsResult, String> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err("search_tags requires a non-empty query".to_string());
    }

    let shards = store.all().map_err(|err| err.to_string())?;
    let summaries = summarize_tags(&shards);
    let tags = fuzzy_search(query, &summaries, MAX_TAG_RESULTS)
        .into_iter()
        .map(|(summary, score)| TagSearchEntry {
            tag: summary.tag,
            shard_count: summary.shard_count,
            score,
        })
        .collect();

    Ok(SearchTagsResult {
        query: query.to_string(),
        tags,
    })
}
