use memshard_store::UpsertOutcome;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateShardRequest {
    /// Path to the source file, relative to the project root.
    #[schemars(description = "Path to the source file (relative to project root)")]
    pub file: String,

    /// Text marking the start of the region.
    #[schemars(
        description = "Text marking the start of the region (e.g. \"def process_upload(\"). Must appear in the file."
    )]
    pub from_text: String,

    /// Text marking the end of the region.
    #[schemars(
        description = "Text marking the end of the region (e.g. \"return response\"). Must appear after from_text."
    )]
    pub to_text: String,

    /// Tags for organizing and querying shards. At least one is required.
    #[schemars(description = "Tags for organizing and querying shards (e.g. [\"auth\", \"api\"])")]
    pub tags: Vec<String>,

    /// Optional summary shown instead of raw content while the shard is
    /// healthy. Skip it when the code speaks for itself.
    #[schemars(
        description = "Optional summary. Shown instead of raw content while the shard is healthy; use it when your interpretation of the code is more useful than the code itself."
    )]
    pub summary: Option<String>,

    /// Project directory path.
    #[schemars(
        description = "Project directory path (defaults to MEMSHARD_ROOT/MEMSHARD_PROJECT_ROOT, then cwd)"
    )]
    pub path: Option<String>,
}

/// Mirror of [`UpsertOutcome`] for the wire schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreateAction {
    Inserted,
    Refreshed,
}

impl From<UpsertOutcome> for CreateAction {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Inserted => CreateAction::Inserted,
            UpsertOutcome::Refreshed => CreateAction::Refreshed,
        }
    }
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct CreateShardResult {
    pub status: String,
    /// Whether the call inserted a new shard or refreshed an existing one
    /// at the same anchors.
    pub action: CreateAction,
    pub shard_id: String,
    pub file: String,
    /// 1-indexed inclusive line range of the captured region.
    pub lines: String,
    pub tags: Vec<String>,
    pub has_summary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_anchor: Option<String>,
}
