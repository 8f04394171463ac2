//! Tool contract layer: results, registry/dispatcher, metrics and the MCP server.

pub mod metrics;
pub mod registry;
pub mod result;
pub mod server;

pub use metrics::{CallOutcome, LatencySnapshot, MetricsSnapshot, ToolMetrics};
pub use registry::{ParameterSpec, StorageTool, ToolDescriptor, ToolInvocation, ToolRegistry};
pub use result::{ToolFailure, ToolResult};
pub use server::{StorageMcpServer, DEFAULT_SERVER_NAME};
