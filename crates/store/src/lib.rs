//! # Memshard Store
//!
//! Durable keyed storage for memory shards plus the tag surface built on
//! top of it: one pretty-printed JSON file per project root, an exclusive
//! lock file around every load-mutate-persist cycle, and tag aggregation
//! with fuzzy search and recency ranking.

mod error;
mod shard;
mod store;
mod tags;

pub use error::StoreError;
pub use shard::{content_hash, hex_encode_lower, shard_id, unix_ms, Shard};
pub use store::{
    ShardFilter, ShardStore, TagRemoval, UpsertOutcome, ViewUpdate, STORE_DIR_NAME,
};
pub use tags::{fuzzy_search, rank_by_recency, summarize_tags, TagSummary};
