//! Tool registry and dispatcher.
//!
//! A [`StorageTool`] declares its name, schema and handler with static types.
//! [`ToolRegistry`] erases those types behind a name-indexed table so the MCP
//! server can list descriptors and route invocations without knowing any
//! individual tool.

use std::{borrow::Cow, collections::HashMap, sync::Arc, time::Instant};

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, JsonObject, Tool};
use schemars::{generate::SchemaSettings, JsonSchema};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    metrics::{CallOutcome, ToolMetrics},
    result::ToolResult,
};
use crate::{
    annotations::ToolAnnotations,
    error::{McpError, McpResult},
};

/// A tool with typed parameters and output.
///
/// `Params` doubles as the input schema: it is generated from the type and
/// enforced by deserializing the invocation arguments, so handlers never see
/// a missing required field or a mistyped value.
#[async_trait]
pub trait StorageTool: Send + Sync + 'static {
    const NAME: &'static str;
    const TITLE: &'static str;
    const DESCRIPTION: &'static str;

    type Params: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::default()
    }

    async fn handle(&self, params: Self::Params) -> ToolResult<Self::Output>;
}

/// Immutable description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
    pub annotations: ToolAnnotations,
}

/// One entry of a descriptor's input schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    /// JSON types accepted, excluding `null`.
    pub types: Vec<String>,
    pub required: bool,
    pub description: Option<String>,
}

impl ToolDescriptor {
    fn for_tool<T: StorageTool>() -> McpResult<Self> {
        Ok(Self {
            name: T::NAME,
            title: T::TITLE,
            description: T::DESCRIPTION,
            input_schema: Arc::new(input_schema_for::<T::Params>(T::NAME)?),
            annotations: T::annotations(),
        })
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> Vec<ParameterSpec> {
        let required: Vec<&str> = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let Some(properties) = self.input_schema.get("properties").and_then(Value::as_object)
        else {
            return Vec::new();
        };

        properties
            .iter()
            .map(|(name, schema)| ParameterSpec {
                name: name.clone(),
                types: schema_types(schema),
                required: required.contains(&name.as_str()),
                description: schema
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect()
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterSpec> {
        self.parameters().into_iter().find(|p| p.name == name)
    }

    pub fn to_rmcp(&self) -> Tool {
        Tool {
            name: Cow::Borrowed(self.name),
            title: Some(self.title.to_string()),
            description: Some(Cow::Borrowed(self.description)),
            input_schema: self.input_schema.clone(),
            output_schema: None,
            annotations: Some(self.annotations.to_rmcp(Some(self.title))),
            icons: None,
        }
    }
}

fn schema_types(schema: &Value) -> Vec<String> {
    let mut types = Vec::new();
    match schema.get("type") {
        Some(Value::String(t)) => types.push(t.clone()),
        Some(Value::Array(ts)) => types.extend(ts.iter().filter_map(Value::as_str).map(String::from)),
        _ => {}
    }
    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = schema.get(key).and_then(Value::as_array) {
            for variant in variants {
                types.extend(schema_types(variant));
            }
        }
    }
    types.retain(|t| t != "null");
    types.dedup();
    types
}

fn input_schema_for<P: JsonSchema>(tool_name: &str) -> McpResult<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.inline_subschemas = true;
    let schema = settings.into_generator().into_root_schema_for::<P>();

    let Value::Object(mut map) = serde_json::to_value(&schema)? else {
        return Err(McpError::Schema(tool_name.to_string()));
    };
    map.remove("$schema");
    map.remove("title");
    map.insert("type".to_string(), Value::String("object".to_string()));
    map.entry("properties")
        .or_insert_with(|| Value::Object(JsonObject::new()));
    Ok(map)
}

/// Inbound request to run a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: JsonObject,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Build from an untyped JSON value; `null` means no arguments.
    pub fn from_value(tool_name: impl Into<String>, arguments: Value) -> McpResult<Self> {
        let tool_name = tool_name.into();
        match arguments {
            Value::Object(map) => Ok(Self::new(tool_name, map)),
            Value::Null => Ok(Self::new(tool_name, JsonObject::new())),
            other => Err(McpError::InvalidArguments {
                tool_name,
                reason: format!("arguments must be a JSON object, got {other}"),
            }),
        }
    }
}

impl From<CallToolRequestParam> for ToolInvocation {
    fn from(request: CallToolRequestParam) -> Self {
        Self::new(request.name, request.arguments.unwrap_or_default())
    }
}

#[async_trait]
trait ErasedTool: Send + Sync {
    async fn invoke(&self, arguments: JsonObject) -> McpResult<ToolResult<Value>>;
}

struct Bound<T>(T);

#[async_trait]
impl<T: StorageTool> ErasedTool for Bound<T> {
    async fn invoke(&self, arguments: JsonObject) -> McpResult<ToolResult<Value>> {
        let params: T::Params = serde_json::from_value(Value::Object(arguments)).map_err(|e| {
            McpError::InvalidArguments {
                tool_name: T::NAME.to_string(),
                reason: e.to_string(),
            }
        })?;
        let result = self.0.handle(params).await;
        Ok(result.into_json()?)
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    tool: Box<dyn ErasedTool>,
}

/// Name-indexed table of tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<&'static str, usize>,
    metrics: Arc<ToolMetrics>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            metrics: Arc::new(ToolMetrics::new()),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<ToolMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn register<T: StorageTool>(&mut self, tool: T) -> McpResult<()> {
        if self.index.contains_key(T::NAME) {
            return Err(McpError::ToolCollision(T::NAME.to_string()));
        }
        let descriptor = ToolDescriptor::for_tool::<T>()?;
        debug!(tool = T::NAME, "Registered tool");
        self.index.insert(T::NAME, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            tool: Box::new(Bound(tool)),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn metrics(&self) -> &Arc<ToolMetrics> {
        &self.metrics
    }

    /// Route an invocation to its handler.
    ///
    /// Unknown tools and arguments that do not match the schema are errors;
    /// everything a handler returns, including failures, is `Ok`.
    pub async fn dispatch(&self, invocation: ToolInvocation) -> McpResult<ToolResult<Value>> {
        let ToolInvocation {
            tool_name,
            arguments,
        } = invocation;

        let Some(&slot) = self.index.get(tool_name.as_str()) else {
            warn!(tool = %tool_name, "Unknown tool requested");
            return Err(McpError::ToolNotFound(tool_name));
        };
        let entry = &self.tools[slot];
        let name = entry.descriptor.name;

        debug!(tool = name, "Dispatching tool call");
        self.metrics.record_call_start(name);
        let _active = scopeguard::guard(Arc::clone(&self.metrics), |metrics| {
            metrics.record_execution_end();
        });
        let started = Instant::now();

        let outcome = entry.tool.invoke(arguments).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) if result.is_success() => {
                self.metrics
                    .record_call_end(name, CallOutcome::Succeeded, duration_ms);
                info!(tool = name, duration_ms, "Tool call succeeded");
            }
            Ok(result) => {
                self.metrics
                    .record_call_end(name, CallOutcome::Failed, duration_ms);
                info!(
                    tool = name,
                    duration_ms,
                    error = result.error().unwrap_or_default(),
                    "Tool call failed"
                );
            }
            Err(e) => {
                self.metrics
                    .record_call_end(name, CallOutcome::Rejected, duration_ms);
                warn!(tool = name, error = %e, "Tool call rejected");
            }
        }

        outcome
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::core::result::ToolFailure;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase")]
    struct EchoParams {
        #[schemars(description = "Text to echo")]
        text: String,
        #[schemars(description = "Fail instead of echoing")]
        fail: Option<bool>,
    }

    #[derive(Debug, Serialize)]
    struct EchoOutput {
        text: String,
    }

    struct Echo;

    #[async_trait]
    impl StorageTool for Echo {
        const NAME: &'static str = "echo";
        const TITLE: &'static str = "Echo";
        const DESCRIPTION: &'static str = "Echoes its input.";

        type Params = EchoParams;
        type Output = EchoOutput;

        fn annotations() -> ToolAnnotations {
            ToolAnnotations::read_only()
        }

        async fn handle(&self, params: EchoParams) -> ToolResult<EchoOutput> {
            if params.fail.unwrap_or(false) {
                return ToolFailure::validation("asked to fail").into();
            }
            ToolResult::Success(EchoOutput { text: params.text })
        }
    }

    struct Stall;

    #[async_trait]
    impl StorageTool for Stall {
        const NAME: &'static str = "stall";
        const TITLE: &'static str = "Stall";
        const DESCRIPTION: &'static str = "Never completes.";

        type Params = EchoParams;
        type Output = EchoOutput;

        async fn handle(&self, _params: EchoParams) -> ToolResult<EchoOutput> {
            std::future::pending().await
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry.register(Echo).unwrap_err();
        assert!(matches!(err, McpError::ToolCollision(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_descriptor_parameters() {
        let registry = registry();
        let descriptor = registry.descriptor("echo").unwrap();
        assert_eq!(descriptor.input_schema["type"], "object");

        let params = descriptor.parameters();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["text", "fail"]);

        let text = descriptor.parameter("text").unwrap();
        assert!(text.required);
        assert_eq!(text.types, vec!["string"]);
        assert_eq!(text.description.as_deref(), Some("Text to echo"));

        let fail = descriptor.parameter("fail").unwrap();
        assert!(!fail.required);
        assert_eq!(fail.types, vec!["boolean"]);
    }

    #[test]
    fn test_descriptor_to_rmcp() {
        let registry = registry();
        let tool = registry.descriptor("echo").unwrap().to_rmcp();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.title.as_deref(), Some("Echo"));
        assert_eq!(tool.description.as_deref(), Some("Echoes its input."));
        let annotations = tool.annotations.unwrap();
        assert_eq!(annotations.read_only_hint, Some(true));
    }

    #[tokio::test]
    async fn test_dispatch_success_and_failure() {
        let registry = registry();

        let ok = registry
            .dispatch(ToolInvocation::from_value("echo", json!({"text": "hi"})).unwrap())
            .await
            .unwrap();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"success": true, "text": "hi"}));

        let failed = registry
            .dispatch(
                ToolInvocation::from_value("echo", json!({"text": "hi", "fail": true})).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(failed.error(), Some("asked to fail"));

        let snapshot = registry.metrics().snapshot();
        assert_eq!(snapshot.total_calls, 2);
        assert_eq!(snapshot.successful_calls, 1);
        assert_eq!(snapshot.failed_calls, 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = registry();
        let err = registry
            .dispatch(ToolInvocation::new("nope", JsonObject::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(name) if name == "nope"));
        assert_eq!(registry.metrics().snapshot().total_calls, 0);
    }

    #[tokio::test]
    async fn test_dispatch_schema_mismatch() {
        let registry = registry();

        let missing = registry
            .dispatch(ToolInvocation::new("echo", JsonObject::new()))
            .await
            .unwrap_err();
        assert!(matches!(missing, McpError::InvalidArguments { .. }));

        let mistyped = registry
            .dispatch(ToolInvocation::from_value("echo", json!({"text": 42})).unwrap())
            .await
            .unwrap_err();
        assert!(mistyped.to_string().contains("echo"));

        assert_eq!(registry.metrics().snapshot().rejected_calls, 2);
    }

    #[test]
    fn test_invocation_from_value() {
        let inv = ToolInvocation::from_value("echo", Value::Null).unwrap();
        assert!(inv.arguments.is_empty());
        assert!(ToolInvocation::from_value("echo", json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_releases_active_execution() {
        let mut registry = registry();
        registry.register(Stall).unwrap();

        let call = registry
            .dispatch(ToolInvocation::from_value("stall", json!({"text": "hi"})).unwrap());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), call).await;
        assert!(timed_out.is_err());

        let snapshot = registry.metrics().snapshot();
        assert_eq!(snapshot.total_calls, 1);
        assert_eq!(snapshot.active_executions, 0);
        assert_eq!(snapshot.successful_calls + snapshot.failed_calls, 0);
    }
}
