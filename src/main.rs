use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use s3_mcp_server::{build_aws_server, logging, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    logging::init(&config)?;

    info!(
        name = %config.server_name,
        version = env!("CARGO_PKG_VERSION"),
        region = %config.effective_region(),
        "Starting S3 MCP server on stdio"
    );

    let server = build_aws_server(&config).context("failed to register storage tools")?;
    let metrics = server.registry().metrics().clone();

    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    let reason = running.waiting().await?;

    let snapshot = metrics.snapshot();
    info!(
        ?reason,
        total_calls = snapshot.total_calls,
        successful_calls = snapshot.successful_calls,
        failed_calls = snapshot.failed_calls,
        rejected_calls = snapshot.rejected_calls,
        success_rate = snapshot.success_rate(),
        "S3 MCP server stopped"
    );
    for (tool, latency) in metrics.all_tool_latencies() {
        info!(
            tool = %tool,
            calls = latency.count,
            avg_ms = latency.avg_ms,
            max_ms = latency.max_ms,
            "Tool latency"
        );
    }

    Ok(())
}
