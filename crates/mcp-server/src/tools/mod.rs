//! Memshard MCP tool surface.
//!
//! Split into submodules to keep schemas, dispatch, and per-tool
//! implementations reviewable: `schemas` holds the request/response
//! contracts, `dispatch` owns the service and router, and the remaining
//! modules compute one tool result each.

mod catalog;
mod create_shard;
mod delete_tag;
mod dispatch;
mod root;
mod schemas;
mod search_tags;
mod tags_resource;
mod util;
mod view_shards;

pub use dispatch::MemshardService;
