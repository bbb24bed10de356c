//! Memshard MCP Server
//!
//! Lets AI agents save live windows into code regions ("shards") and recall
//! them later, with drift-aware health tracking and automatic expiry.
//!
//! ## Tools
//!
//! - `create_shard` - Save (or refresh) a shard anchored between two text snippets
//! - `view_shards` - Resolve shards against current file content, with health
//! - `search_tags` - Fuzzy-search tag names with shard counts
//! - `delete_tag` - Remove a tag everywhere; orphaned shards are deleted
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "memshard": {
//!       "command": "memshard-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

use tools::MemshardService;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Memshard MCP server");

    let service = MemshardService::new();
    let server = service.serve(stdio()).await?;

    server.waiting().await?;

    log::info!("Memshard MCP server stopped");
    Ok(())
}
