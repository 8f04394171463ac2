//! Bucket policy tools: `get_bucket_policy`, `set_bucket_policy`.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::{
    annotations::ToolAnnotations,
    backend::ObjectStore,
    core::{
        registry::StorageTool,
        result::{ToolFailure, ToolResult},
    },
};

pub const INVALID_POLICY_JSON: &str = "Invalid policy JSON format";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetBucketPolicyParams {
    #[schemars(description = "Name of the bucket to get the policy for")]
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBucketPolicyOutput {
    pub bucket_name: String,
    /// Parsed document, the raw text when it is not JSON, or `null` when unset.
    pub policy: Value,
}

pub struct GetBucketPolicy {
    store: Arc<dyn ObjectStore>,
}

impl GetBucketPolicy {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

fn parse_policy(raw: Option<String>) -> Value {
    match raw {
        None => Value::Null,
        Some(text) if text.is_empty() => Value::Null,
        Some(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
    }
}

#[async_trait]
impl StorageTool for GetBucketPolicy {
    const NAME: &'static str = "get_bucket_policy";
    const TITLE: &'static str = "Get Bucket Policy";
    const DESCRIPTION: &'static str = "Retrieves the policy for an S3 bucket.";

    type Params = GetBucketPolicyParams;
    type Output = GetBucketPolicyOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    async fn handle(&self, params: GetBucketPolicyParams) -> ToolResult<GetBucketPolicyOutput> {
        match self.store.get_bucket_policy(&params.bucket_name).await {
            Ok(raw) => ToolResult::Success(GetBucketPolicyOutput {
                bucket_name: params.bucket_name,
                policy: parse_policy(raw),
            }),
            // A bucket without a policy is a valid answer, not a failure.
            Err(e) if e.is_no_such_bucket_policy() => {
                debug!(bucket = %params.bucket_name, "Bucket has no policy");
                ToolResult::Success(GetBucketPolicyOutput {
                    bucket_name: params.bucket_name,
                    policy: Value::Null,
                })
            }
            Err(e) => {
                error!(bucket = %params.bucket_name, error = %e, "Error getting bucket policy");
                ToolFailure::storage(&e, "Failed to get bucket policy")
                    .with_bucket(params.bucket_name)
                    .into()
            }
        }
    }
}

/// A policy supplied either as JSON text or as a structured document.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PolicyDocument {
    Text(String),
    Document(Map<String, Value>),
}

impl PolicyDocument {
    /// Compact JSON text to send to the backend.
    ///
    /// Text input must parse as JSON. Both forms are re-serialized with object
    /// keys sorted, so equivalent inputs produce identical payloads.
    pub fn to_policy_text(&self) -> Result<String, ToolFailure> {
        let value = match self {
            PolicyDocument::Document(map) => Value::Object(map.clone()),
            PolicyDocument::Text(text) => serde_json::from_str::<Value>(text)
                .map_err(|_| ToolFailure::validation(INVALID_POLICY_JSON))?,
        };
        serde_json::to_string(&sorted_keys(value))
            .map_err(|_| ToolFailure::validation(INVALID_POLICY_JSON))
    }
}

fn sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, sorted_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_keys).collect()),
        other => other,
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBucketPolicyParams {
    #[schemars(description = "Name of the bucket to set the policy for")]
    pub bucket_name: String,
    #[schemars(description = "The policy document as a JSON string or object")]
    pub policy: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBucketPolicyOutput {
    pub bucket_name: String,
}

pub struct SetBucketPolicy {
    store: Arc<dyn ObjectStore>,
}

impl SetBucketPolicy {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for SetBucketPolicy {
    const NAME: &'static str = "set_bucket_policy";
    const TITLE: &'static str = "Set Bucket Policy";
    const DESCRIPTION: &'static str = "Sets or updates the policy for an S3 bucket.";

    type Params = SetBucketPolicyParams;
    type Output = SetBucketPolicyOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::new().with_idempotent(true)
    }

    async fn handle(&self, params: SetBucketPolicyParams) -> ToolResult<SetBucketPolicyOutput> {
        let policy = match params.policy.to_policy_text() {
            Ok(policy) => policy,
            Err(failure) => return failure.with_bucket(params.bucket_name).into(),
        };

        match self
            .store
            .put_bucket_policy(&params.bucket_name, &policy)
            .await
        {
            Ok(()) => ToolResult::Success(SetBucketPolicyOutput {
                bucket_name: params.bucket_name,
            }),
            Err(e) => {
                error!(bucket = %params.bucket_name, error = %e, "Error setting bucket policy");
                ToolFailure::storage(&e, "Failed to set bucket policy")
                    .with_bucket(params.bucket_name)
                    .into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!(parse_policy(None), Value::Null);
        assert_eq!(
            parse_policy(Some(r#"{"Version":"2012-10-17"}"#.to_string())),
            json!({"Version": "2012-10-17"})
        );
        assert_eq!(
            parse_policy(Some("not json".to_string())),
            Value::String("not json".to_string())
        );
    }

    #[test]
    fn test_policy_document_deserializes_both_forms() {
        let text: PolicyDocument = serde_json::from_value(json!("{\"a\":1}")).unwrap();
        assert!(matches!(text, PolicyDocument::Text(_)));

        let doc: PolicyDocument = serde_json::from_value(json!({"a": 1})).unwrap();
        assert!(matches!(doc, PolicyDocument::Document(_)));

        assert!(serde_json::from_value::<PolicyDocument>(json!(42)).is_err());
    }

    #[test]
    fn test_equivalent_policies_serialize_identically() {
        let doc: PolicyDocument = serde_json::from_value(json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Principal": "*"}]
        }))
        .unwrap();
        let text = PolicyDocument::Text(
            r#"{ "Version": "2012-10-17", "Statement": [ { "Effect": "Allow", "Principal": "*" } ] }"#
                .to_string(),
        );
        assert_eq!(doc.to_policy_text().unwrap(), text.to_policy_text().unwrap());
    }

    #[test]
    fn test_key_order_does_not_change_payload() {
        let doc: PolicyDocument = serde_json::from_value(json!({
            "Version": "2012-10-17",
            "Statement": [{"Principal": "*", "Effect": "Allow"}]
        }))
        .unwrap();
        let text = PolicyDocument::Text(
            r#"{"Statement":[{"Effect":"Allow","Principal":"*"}],"Version":"2012-10-17"}"#
                .to_string(),
        );

        let sent = doc.to_policy_text().unwrap();
        assert_eq!(sent, text.to_policy_text().unwrap());
        assert_eq!(
            sent,
            r#"{"Statement":[{"Effect":"Allow","Principal":"*"}],"Version":"2012-10-17"}"#
        );
    }

    #[test]
    fn test_invalid_policy_text() {
        let failure = PolicyDocument::Text("{not valid json".to_string())
            .to_policy_text()
            .unwrap_err();
        assert_eq!(failure.error, INVALID_POLICY_JSON);
    }
}
