//! The `memshard://tags` resource: a passively loaded, recency-ranked
//! listing of the most recently used tags.

use memshard_store::{rank_by_recency, summarize_tags, ShardStore};

use super::schemas::tags::{TagListingEntry, TAGS_RESOURCE_LIMIT};

pub(super) fn compute_tags_listing(store: &ShardStore) -> Result<String, String> {
    let shards = store.all().map_err(|err| err.to_string())?;
    let ranked = rank_by_recency(summarize_tags(&shards));

    let entries: Vec<TagListingEntry> = ranked
        .into_iter()
        .take(TAGS_RESOURCE_LIMIT)
        .map(|summary| TagListingEntry {
            tag: summary.tag,
            shard_count: summary.shard_count,
            last_viewed_at: summary.last_viewed_at,
        })
        .collect();

    serde_json::to_string_pretty(&entries).map_err(|err| err.to_string())
}
