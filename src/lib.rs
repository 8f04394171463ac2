//! Composition root for the S3 MCP server binary.

pub mod config;
pub mod logging;
pub mod storage;

use std::sync::Arc;

use s3_mcp::{McpResult, ObjectStore, StorageMcpServer};

pub use config::ServerConfig;
use storage::{AwsObjectStore, ClientSettings, S3ClientProvider};

/// Build the MCP server with every storage tool bound to `store`.
pub fn build_server(config: &ServerConfig, store: Arc<dyn ObjectStore>) -> McpResult<StorageMcpServer> {
    let registry = s3_mcp::storage_registry(store)?;
    Ok(StorageMcpServer::new(Arc::new(registry)).with_server_name(config.server_name.clone()))
}

/// Build the MCP server against the AWS backend described by `config`.
pub fn build_aws_server(config: &ServerConfig) -> McpResult<StorageMcpServer> {
    let provider = Arc::new(S3ClientProvider::new(ClientSettings::from_config(config)));
    build_server(config, Arc::new(AwsObjectStore::new(provider)))
}
