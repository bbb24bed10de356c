use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted state cannot be parsed. Fails loudly rather than silently
    /// discarding memory.
    #[error("shard store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("shard store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A shard with no tags is not a valid persisted state.
    #[error("a shard must carry at least one tag")]
    EmptyTags,
}
