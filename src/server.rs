//! MCP server implementation and session state management.

use crate::builder::IndexBuilder;
use crate::config::SearchConfig;
use crate::tools::load_index::{LoadIndexRequest, handle_load_index};
use crate::tools::search::{QueryCache, SearchRequest, handle_search};
use crate::tools::stats::handle_index_stats;
use crate::worker::IndexState;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::borrow::Cow;
use std::sync::Arc;

/// State shared by every tool call: the index snapshot, the response cache,
/// and request defaults.
#[derive(Debug, Clone)]
pub struct ServerContext {
    state: Arc<IndexState>,
    cache: Arc<QueryCache>,
    default_limit: usize,
}

impl ServerContext {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            state: Arc::new(IndexState::new(IndexBuilder::from_config(config))),
            cache: Arc::new(QueryCache::new(config.query_cache_size)),
            default_limit: config.default_limit,
        }
    }

    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }
}

/// MCP server answering documentation search queries
#[derive(Clone)]
pub struct DocSearchServer {
    context: ServerContext,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DocSearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocSearchServer")
            .field("context", &self.context)
            .finish()
    }
}

#[tool_router]
impl DocSearchServer {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            context: ServerContext::new(config),
            tool_router: Self::tool_router(),
        }
    }

    pub const fn context(&self) -> &ServerContext {
        &self.context
    }

    #[tool(
        description = "Load a documentation search index artifact (e.g. a Documenter.jl search_index.js, or a JSON array of {location, page, title, text, category} records). Builds the index in the background and replaces the current one once ready. Returns index statistics.",
        input_schema = inline_schema_for_type::<LoadIndexRequest>()
    )]
    async fn load_index(
        &self,
        Parameters(request): Parameters<LoadIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_load_index(&self.context, request).await
    }

    #[tool(
        description = "Search the loaded documentation index. Matches query words against record titles, page names, and body text, ranking title matches highest. Returns a numbered list with title, category, page, location, and score.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.context, request).await
    }

    #[tool(description = "Show statistics for the currently loaded index: source, record count, term count, postings, and content fingerprint.")]
    async fn index_stats(&self) -> std::result::Result<String, String> {
        handle_index_stats(&self.context).await
    }
}

#[tool_handler]
impl ServerHandler for DocSearchServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "docsearch: full-text search over static documentation site indices. \
             Use load_index with the path to a search_index.js artifact, then search. \
             If DOCSEARCH_INDEX was set at startup, an index is already loaded."
                .to_string(),
        );
        info
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

/// Generate an inline JSON schema for MCP tools
///
/// Sets `inline_subschemas = true` so the `mode` enum is rendered inline
/// instead of behind a `$ref`, which MCP clients display as a dropdown.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
