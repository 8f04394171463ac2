//! MCP server handler for the storage tools.
//!
//! Implements RMCP's `ServerHandler` trait over a [`ToolRegistry`]:
//! - `tools/list` publishes every registered descriptor
//! - `tools/call` dispatches by name and returns the result as JSON text

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData, RoleServer, ServerHandler,
};
use tracing::debug;

use super::registry::{ToolInvocation, ToolRegistry};

pub const DEFAULT_SERVER_NAME: &str = "aws-s3-mcp";

const INSTRUCTIONS: &str = "MCP Server for AWS S3 operations. Every tool returns a JSON object \
     with a boolean `success` field; failures carry an `error` message.";

#[derive(Clone)]
pub struct StorageMcpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl StorageMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        let mut server_info = ServerInfo::default();
        server_info.capabilities = ServerCapabilities::builder().enable_tools().build();
        server_info.server_info.name = DEFAULT_SERVER_NAME.to_string();
        server_info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        server_info.instructions = Some(INSTRUCTIONS.to_string());

        Self {
            registry,
            server_info,
        }
    }

    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_info.server_info.name = name.into();
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.registry.descriptors().map(|d| d.to_rmcp()).collect()
    }

    /// Run one `tools/call` request.
    ///
    /// Handler failures are still successful MCP responses; the `success`
    /// flag inside the JSON text tells them apart.
    pub async fn execute(&self, request: CallToolRequestParam) -> Result<CallToolResult, ErrorData> {
        let result = self.registry.dispatch(ToolInvocation::from(request)).await?;
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| ErrorData::internal_error(format!("serialize tool result: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

impl ServerHandler for StorageMcpServer {
    fn get_info(&self) -> ServerInfo {
        self.server_info.clone()
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.tools();
        debug!(count = tools.len(), "Listing tools");
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.execute(request).await
    }
}
