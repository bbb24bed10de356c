//! MCP tool dispatch for Memshard.
//!
//! One service per stdio connection. Every operation that read-modify-writes
//! the store runs behind a single in-process gate; the store adds a file
//! lock underneath for cross-process safety.

use memshard_resolver::{LifecycleEngine, DEFAULT_MAX_STALE_VIEWS};
use memshard_store::ShardStore;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParam, RawResource, ReadResourceRequestParam, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::catalog;
use super::create_shard::compute_create_shard_result;
use super::delete_tag::compute_delete_tag_result;
use super::root::resolve_root;
use super::schemas::create_shard::CreateShardRequest;
use super::schemas::tags::{DeleteTagRequest, SearchTagsRequest, TAGS_RESOURCE_URI};
use super::schemas::view_shards::ViewShardsRequest;
use super::search_tags::compute_search_tags_result;
use super::tags_resource::compute_tags_listing;
use super::view_shards::compute_view_shards_result;

/// Memshard MCP Service
#[derive(Clone)]
pub struct MemshardService {
    /// Lifecycle policy (stale-view budget)
    lifecycle: LifecycleEngine,
    /// Tool router
    tool_router: ToolRouter<Self>,
    /// Serializes every load-mutate-persist cycle in this process
    store_gate: Arc<Mutex<()>>,
}

impl Default for MemshardService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemshardService {
    pub fn new() -> Self {
        Self {
            lifecycle: lifecycle_from_env(),
            tool_router: Self::tool_router(),
            store_gate: Arc::new(Mutex::new(())),
        }
    }

    fn open_store(raw_path: Option<&str>) -> Result<ShardStore, String> {
        let (root, _display) = resolve_root(raw_path)?;
        ShardStore::open(&root).map_err(|err| err.to_string())
    }
}

const MIN_STALE_VIEWS: u32 = 1;
const MAX_STALE_VIEWS: u32 = 100;

fn lifecycle_from_env() -> LifecycleEngine {
    let threshold = std::env::var("MEMSHARD_MAX_STALE_VIEWS")
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_STALE_VIEWS)
        .clamp(MIN_STALE_VIEWS, MAX_STALE_VIEWS);
    LifecycleEngine::new(threshold)
}

fn to_call_result<T: Serialize>(result: Result<T, String>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&value).unwrap_or_default(),
        )]),
        Err(message) => CallToolResult::error(vec![Content::text(message)]),
    }
}

#[tool_router]
impl MemshardService {
    /// Save a live window into a code region as a memory shard.
    #[tool(
        description = "Save a live window into a code region as a memory shard. The shard points at the region between from_text and to_text; future views resolve it against current file content and track health. Re-creating at the same anchors refreshes the shard and resets its health."
    )]
    pub async fn create_shard(
        &self,
        Parameters(request): Parameters<CreateShardRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _gate = self.store_gate.lock().await;
        let result = Self::open_store(request.path.as_deref()).and_then(|store| {
            compute_create_shard_result(store.root(), &store, &request)
        });
        Ok(to_call_result(result))
    }

    /// View memory shards with live content and health status.
    #[tool(
        description = "View memory shards with live content and health status. Requires a `tags` and/or `file` filter; results are ordered oldest-created-first and paginated. Healthy shards show their summary when present; degraded and stale shards always show raw resolved content. Shards that stay stale across consecutive views are deleted automatically."
    )]
    pub async fn view_shards(
        &self,
        Parameters(request): Parameters<ViewShardsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _gate = self.store_gate.lock().await;
        let result = Self::open_store(request.path.as_deref()).and_then(|store| {
            compute_view_shards_result(store.root(), &store, &self.lifecycle, &request)
        });
        Ok(to_call_result(result))
    }

    /// Fuzzy-search tag names with shard counts.
    #[tool(
        description = "Fuzzy-search tag names across all shards. Returns up to 20 matching tags with their shard counts, best match first."
    )]
    pub async fn search_tags(
        &self,
        Parameters(request): Parameters<SearchTagsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _gate = self.store_gate.lock().await;
        let result = Self::open_store(request.path.as_deref())
            .and_then(|store| compute_search_tags_result(&store, &request));
        Ok(to_call_result(result))
    }

    /// Remove a tag from all shards; orphaned shards are deleted.
    #[tool(
        description = "Remove a tag from every shard carrying it. Shards whose tag set becomes empty are deleted outright."
    )]
    pub async fn delete_tag(
        &self,
        Parameters(request): Parameters<DeleteTagRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _gate = self.store_gate.lock().await;
        let result = Self::open_store(request.path.as_deref())
            .and_then(|store| compute_delete_tag_result(&store, &request));
        Ok(to_call_result(result))
    }
}

#[tool_handler]
impl ServerHandler for MemshardService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(catalog::tool_instructions()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut resource = RawResource::new(TAGS_RESOURCE_URI, "tags");
        resource.description =
            Some("Recently used shard tags, most recently viewed first".to_string());
        resource.mime_type = Some("application/json".to_string());
        Ok(ListResourcesResult {
            resources: vec![resource.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if request.uri != TAGS_RESOURCE_URI {
            return Err(McpError::resource_not_found(
                format!("unknown resource uri: {}", request.uri),
                None,
            ));
        }

        let _gate = self.store_gate.lock().await;
        let listing = Self::open_store(None)
            .and_then(|store| compute_tags_listing(&store))
            .map_err(|message| McpError::internal_error(message, None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(listing, TAGS_RESOURCE_URI)],
        })
    }
}
