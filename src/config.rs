//! Command line and environment configuration.

use clap::Parser;
use s3_mcp::DEFAULT_SERVER_NAME;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Parser)]
#[command(name = "aws-s3-mcp", version, about = "MCP server for AWS S3 operations")]
pub struct ServerConfig {
    /// AWS region for the S3 client
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Endpoint override for S3-compatible services (MinIO, LocalStack)
    #[arg(long, env = "S3_MCP_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, env = "S3_MCP_FORCE_PATH_STYLE", default_value_t = false)]
    pub force_path_style: bool,

    /// Name reported in the MCP initialize response
    #[arg(long, env = "S3_MCP_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    pub server_name: String,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, env = "S3_MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit JSON log lines
    #[arg(long, env = "S3_MCP_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl ServerConfig {
    /// Configured region, or `us-east-1` when unset or blank.
    pub fn effective_region(&self) -> String {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
            .to_string()
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            force_path_style: false,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}
