//! S3 storage operations exposed as Model Context Protocol (MCP) tools.
//!
//! ## Modules
//!
//! - [`backend`]: the [`ObjectStore`] boundary the tools call into
//! - [`tools`]: the nine storage tools and their parameter types
//! - [`core`]: result envelope, tool registry/dispatcher, metrics, MCP server
//!
//! ## Wiring
//!
//! ```ignore
//! let store: Arc<dyn ObjectStore> = Arc::new(my_store);
//! let registry = s3_mcp::tools::storage_registry(store)?;
//! let server = StorageMcpServer::new(Arc::new(registry));
//! let running = server.serve(rmcp::transport::stdio()).await?;
//! running.waiting().await?;
//! ```

// Shared types (used across modules)
pub mod annotations;
pub mod backend;
pub mod error;

// Subsystems
pub mod core;
pub mod tools;

pub use annotations::ToolAnnotations;
pub use backend::{
    BucketSummary, CreatedBucket, ListObjectsRequest, ObjectBody, ObjectListing,
    ObjectStore, ObjectSummary, PutObjectOutput, PutObjectRequest,
};
pub use core::{
    CallOutcome, LatencySnapshot, MetricsSnapshot, ParameterSpec, StorageMcpServer, StorageTool,
    ToolDescriptor, ToolFailure, ToolInvocation, ToolMetrics, ToolRegistry, ToolResult,
    DEFAULT_SERVER_NAME,
};
pub use error::{McpError, McpResult, StorageError, StorageResult};
pub use tools::{register_storage_tools, storage_registry, TOOL_NAMES};
