use rmcp::schemars;
use serde::{Deserialize, Serialize};

/// Default page size for `view_shards`.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Upper bound on one page.
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ViewShardsRequest {
    /// Filter by tags (shards matching ANY of them). At least one of
    /// `tags`/`file` is required.
    #[schemars(description = "Filter shards by tags (matches ANY of the given tags)")]
    pub tags: Option<Vec<String>>,

    /// Filter by file path (relative to project root). Combines with
    /// `tags` as an intersection.
    #[schemars(description = "Filter shards by file path; combines with `tags`")]
    pub file: Option<String>,

    /// Show raw resolved content even where a healthy summary exists.
    #[schemars(description = "If true, show raw file content instead of summaries for all shards")]
    pub raw: Option<bool>,

    /// Page size (default 50, bounded).
    #[schemars(description = "Maximum number of shards to return (default 50)")]
    pub limit: Option<usize>,

    /// Pagination offset into the oldest-created-first ordering.
    #[schemars(description = "Pagination offset (shards are ordered oldest-created-first)")]
    pub offset: Option<usize>,

    /// Project directory path.
    #[schemars(
        description = "Project directory path (defaults to MEMSHARD_ROOT/MEMSHARD_PROJECT_ROOT, then cwd)"
    )]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct HealthView {
    /// Similarity between the captured span and the current resolution,
    /// in [0, 1].
    pub score: f64,
    /// healthy | degraded | stale | expired
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ShardView {
    pub shard_id: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<String>,
    pub tags: Vec<String>,
    pub health: HealthView,
    /// Present while the shard is healthy and carries a summary (unless
    /// `raw` was requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Live resolved content; always present for degraded/stale shards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// This view expired the shard; it has been deleted from the store.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expired: bool,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ViewShardsResult {
    pub shards: Vec<ShardView>,
    /// Shards matching the filter before pagination.
    pub total: usize,
    pub returned: usize,
    pub offset: usize,
    pub limit: usize,
    pub truncated: bool,
    /// Shards below the health floor that will be deleted soon unless
    /// re-created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention: Option<String>,
    /// Shards expired and deleted by this view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
}
