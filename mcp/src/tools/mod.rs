//! The nine storage tools and the registry that binds them.

mod buckets;
mod objects;
mod policy;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

pub use buckets::{
    BucketInfo, CreateBucket, CreateBucketOutput, CreateBucketParams, DeleteBucket,
    DeleteBucketOutput, DeleteBucketParams, ListBuckets, ListBucketsOutput, ListBucketsParams,
};
pub use objects::{
    DeleteObject, DeleteObjectOutput, DeleteObjectParams, DownloadObject, DownloadObjectOutput,
    DownloadObjectParams, DownloadTarget, ListObjects, ListObjectsOutput, ListObjectsParams,
    StorageObjectRecord, UploadObject, UploadObjectOutput, UploadObjectParams, UploadSource,
    DOWNLOAD_TARGET_REQUIRED, UPLOAD_SOURCE_CONFLICT,
};
pub use policy::{
    GetBucketPolicy, GetBucketPolicyOutput, GetBucketPolicyParams, PolicyDocument,
    SetBucketPolicy, SetBucketPolicyOutput, SetBucketPolicyParams, INVALID_POLICY_JSON,
};

use crate::{backend::ObjectStore, core::registry::ToolRegistry, error::McpResult};

/// Names of every storage tool, in registration order.
pub const TOOL_NAMES: [&str; 9] = [
    "list_buckets",
    "create_bucket",
    "delete_bucket",
    "list_objects",
    "upload_object",
    "download_object",
    "delete_object",
    "get_bucket_policy",
    "set_bucket_policy",
];

/// Register all storage tools against a shared backend.
pub fn register_storage_tools(
    registry: &mut ToolRegistry,
    store: Arc<dyn ObjectStore>,
) -> McpResult<()> {
    registry.register(ListBuckets::new(store.clone()))?;
    registry.register(CreateBucket::new(store.clone()))?;
    registry.register(DeleteBucket::new(store.clone()))?;
    registry.register(ListObjects::new(store.clone()))?;
    registry.register(UploadObject::new(store.clone()))?;
    registry.register(DownloadObject::new(store.clone()))?;
    registry.register(DeleteObject::new(store.clone()))?;
    registry.register(GetBucketPolicy::new(store.clone()))?;
    registry.register(SetBucketPolicy::new(store))?;
    Ok(())
}

/// A registry holding exactly the storage tools.
pub fn storage_registry(store: Arc<dyn ObjectStore>) -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_storage_tools(&mut registry, store)?;
    Ok(registry)
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub(crate) fn iso8601(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Treat empty text parameters as not supplied.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
