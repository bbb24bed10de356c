use rmcp::schemars;
use serde::{Deserialize, Serialize};

/// Fixed cap on fuzzy tag search hits.
pub const MAX_TAG_RESULTS: usize = 20;
/// Tags exposed through the `memshard://tags` resource.
pub const TAGS_RESOURCE_LIMIT: usize = 25;
/// URI of the recency-ranked tag listing resource.
pub const TAGS_RESOURCE_URI: &str = "memshard://tags";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchTagsRequest {
    /// Tag name query; fuzzy-matched against all known tags.
    #[schemars(description = "Tag name query (fuzzy-matched, typo-tolerant)")]
    pub query: String,

    /// Project directory path.
    #[schemars(
        description = "Project directory path (defaults to MEMSHARD_ROOT/MEMSHARD_PROJECT_ROOT, then cwd)"
    )]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct TagSearchEntry {
    pub tag: String,
    pub shard_count: usize,
    /// Match quality relative to the best hit, in (0, 1].
    pub score: f32,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct SearchTagsResult {
    pub query: String,
    pub tags: Vec<TagSearchEntry>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteTagRequest {
    /// Tag to remove from every shard carrying it.
    #[schemars(
        description = "Tag to remove from all shards. Shards left with no tags are deleted."
    )]
    pub tag: String,

    /// Project directory path.
    #[schemars(
        description = "Project directory path (defaults to MEMSHARD_ROOT/MEMSHARD_PROJECT_ROOT, then cwd)"
    )]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct DeleteTagResult {
    /// "ok" when the tag existed, "not_found" otherwise.
    pub status: String,
    pub tag: String,
    /// Shards that carried the tag (orphans included).
    pub modified: usize,
    /// Shards deleted because the removal left them tagless.
    pub orphans_deleted: usize,
}

/// One row of the `memshard://tags` resource.
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct TagListingEntry {
    pub tag: String,
    pub shard_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<u64>,
}
