//! Object tools: `list_objects`, `upload_object`, `download_object`, `delete_object`.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{iso8601, non_empty};
use crate::{
    annotations::ToolAnnotations,
    backend::{ListObjectsRequest, ObjectStore, ObjectSummary, PutObjectRequest},
    core::{
        registry::StorageTool,
        result::{ToolFailure, ToolResult},
    },
};

pub const UPLOAD_SOURCE_CONFLICT: &str =
    "Either filePath OR content must be provided, but not both";

pub const DOWNLOAD_TARGET_REQUIRED: &str = "Either outputPath or returnContent must be provided";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsParams {
    #[schemars(description = "Name of the bucket to list objects from")]
    pub bucket_name: String,
    #[schemars(description = "Filter objects by prefix (folder path)")]
    pub prefix: Option<String>,
    #[schemars(description = "Maximum number of objects to return (default: 1000, max: 1000)")]
    pub max_keys: Option<i32>,
    #[schemars(description = "Token to retrieve the next set of results")]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectRecord {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl From<ObjectSummary> for StorageObjectRecord {
    fn from(object: ObjectSummary) -> Self {
        Self {
            key: object.key.unwrap_or_default(),
            size: object.size.map_or(0, |s| s.max(0) as u64),
            last_modified: object.last_modified.as_ref().map(iso8601),
            etag: object.etag,
            storage_class: object.storage_class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsOutput {
    pub objects: Vec<StorageObjectRecord>,
    pub count: usize,
    pub is_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,
}

pub struct ListObjects {
    store: Arc<dyn ObjectStore>,
}

impl ListObjects {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for ListObjects {
    const NAME: &'static str = "list_objects";
    const TITLE: &'static str = "List Objects";
    const DESCRIPTION: &'static str =
        "Lists objects in an S3 bucket with optional prefix filtering.";

    type Params = ListObjectsParams;
    type Output = ListObjectsOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    async fn handle(&self, params: ListObjectsParams) -> ToolResult<ListObjectsOutput> {
        let request = ListObjectsRequest {
            bucket: params.bucket_name,
            prefix: params.prefix,
            max_keys: params.max_keys,
            continuation_token: params.continuation_token,
        };
        let bucket = request.bucket.clone();

        match self.store.list_objects(request).await {
            Ok(listing) => {
                let objects: Vec<StorageObjectRecord> = listing
                    .objects
                    .into_iter()
                    .map(StorageObjectRecord::from)
                    .collect();
                ToolResult::Success(ListObjectsOutput {
                    count: objects.len(),
                    objects,
                    is_truncated: listing.is_truncated.unwrap_or(false),
                    next_continuation_token: listing.next_continuation_token,
                })
            }
            Err(e) => {
                error!(bucket = %bucket, error = %e, "Error listing objects");
                ToolFailure::storage(&e, "Failed to list objects").into()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadObjectParams {
    #[schemars(description = "Name of the bucket to upload to")]
    pub bucket_name: String,
    #[schemars(description = "Object key (path) in the bucket")]
    pub key: String,
    #[schemars(description = "Local file path to upload (mutually exclusive with content)")]
    pub file_path: Option<String>,
    #[schemars(description = "String content to upload (mutually exclusive with filePath)")]
    pub content: Option<String>,
    #[schemars(description = "MIME type of the content (e.g., 'text/plain', 'application/json')")]
    pub content_type: Option<String>,
}

/// Where an upload body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    File(PathBuf),
    Inline(String),
}

impl UploadObjectParams {
    /// Exactly one of `filePath` and `content` must be set.
    pub fn source(&self) -> Result<UploadSource, ToolFailure> {
        match (
            non_empty(self.file_path.as_deref()),
            non_empty(self.content.as_deref()),
        ) {
            (Some(path), None) => Ok(UploadSource::File(PathBuf::from(path))),
            (None, Some(content)) => Ok(UploadSource::Inline(content.to_string())),
            _ => Err(ToolFailure::validation(UPLOAD_SOURCE_CONFLICT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadObjectOutput {
    pub bucket_name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

pub struct UploadObject {
    store: Arc<dyn ObjectStore>,
}

impl UploadObject {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for UploadObject {
    const NAME: &'static str = "upload_object";
    const TITLE: &'static str = "Upload Object";
    const DESCRIPTION: &'static str = "Uploads a file or content to an S3 bucket.";

    type Params = UploadObjectParams;
    type Output = UploadObjectOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::new().with_idempotent(true)
    }

    async fn handle(&self, params: UploadObjectParams) -> ToolResult<UploadObjectOutput> {
        let source = match params.source() {
            Ok(source) => source,
            Err(failure) => return failure.into(),
        };

        let body = match source {
            UploadSource::File(path) => match tokio::fs::read(&path).await {
                Ok(data) => Bytes::from(data),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Error reading upload source");
                    return ToolFailure::io(&e, "Failed to upload object").into();
                }
            },
            UploadSource::Inline(content) => Bytes::from(content),
        };
        debug!(bucket = %params.bucket_name, key = %params.key, bytes = body.len(), "Uploading object");

        let request = PutObjectRequest {
            bucket: params.bucket_name.clone(),
            key: params.key.clone(),
            body,
            content_type: params.content_type,
        };

        match self.store.put_object(request).await {
            Ok(output) => ToolResult::Success(UploadObjectOutput {
                bucket_name: params.bucket_name,
                key: params.key,
                etag: output.etag,
            }),
            Err(e) => {
                error!(bucket = %params.bucket_name, key = %params.key, error = %e, "Error uploading object");
                ToolFailure::storage(&e, "Failed to upload object").into()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadObjectParams {
    #[schemars(description = "Name of the bucket to download from")]
    pub bucket_name: String,
    #[schemars(description = "Object key (path) in the bucket")]
    pub key: String,
    #[schemars(description = "Local file path to save the downloaded object")]
    pub output_path: Option<String>,
    #[schemars(
        description = "If true, returns the object content in the response (for text files)"
    )]
    pub return_content: Option<bool>,
}

/// What to do with a downloaded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    File(PathBuf),
    Inline,
    FileAndInline(PathBuf),
}

impl DownloadTarget {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            DownloadTarget::File(path) | DownloadTarget::FileAndInline(path) => Some(path),
            DownloadTarget::Inline => None,
        }
    }

    pub fn returns_content(&self) -> bool {
        matches!(
            self,
            DownloadTarget::Inline | DownloadTarget::FileAndInline(_)
        )
    }
}

impl DownloadObjectParams {
    /// At least one of `outputPath` and `returnContent` must be set.
    pub fn target(&self) -> Result<DownloadTarget, ToolFailure> {
        let path = non_empty(self.output_path.as_deref()).map(PathBuf::from);
        match (path, self.return_content.unwrap_or(false)) {
            (Some(path), false) => Ok(DownloadTarget::File(path)),
            (Some(path), true) => Ok(DownloadTarget::FileAndInline(path)),
            (None, true) => Ok(DownloadTarget::Inline),
            (None, false) => Err(ToolFailure::validation(DOWNLOAD_TARGET_REQUIRED)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadObjectOutput {
    pub bucket_name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: u64,
}

pub struct DownloadObject {
    store: Arc<dyn ObjectStore>,
}

impl DownloadObject {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for DownloadObject {
    const NAME: &'static str = "download_object";
    const TITLE: &'static str = "Download Object";
    const DESCRIPTION: &'static str = "Downloads an object from an S3 bucket.";

    type Params = DownloadObjectParams;
    type Output = DownloadObjectOutput;

    fn annotations() -> ToolAnnotations {
        // Writes only to the local filesystem, never to the bucket.
        ToolAnnotations::new()
            .with_destructive(false)
            .with_idempotent(true)
    }

    async fn handle(&self, params: DownloadObjectParams) -> ToolResult<DownloadObjectOutput> {
        let target = match params.target() {
            Ok(target) => target,
            Err(failure) => return failure.into(),
        };

        let object = match self.store.get_object(&params.bucket_name, &params.key).await {
            Ok(object) => object,
            Err(e) => {
                error!(bucket = %params.bucket_name, key = %params.key, error = %e, "Error downloading object");
                return ToolFailure::storage(&e, "Failed to download object").into();
            }
        };

        if let Some(path) = target.path() {
            if let Err(e) = tokio::fs::write(path, &object.data).await {
                error!(path = %path.display(), error = %e, "Error writing downloaded object");
                return ToolFailure::io(&e, "Failed to download object").into();
            }
        }

        let content = target
            .returns_content()
            .then(|| String::from_utf8_lossy(&object.data).into_owned());
        let size = object
            .content_length
            .map_or(object.data.len() as u64, |len| len.max(0) as u64);

        ToolResult::Success(DownloadObjectOutput {
            bucket_name: params.bucket_name,
            key: params.key,
            output_path: target.path().map(|p| p.display().to_string()),
            content,
            content_type: object.content_type,
            size,
        })
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObjectParams {
    #[schemars(description = "Name of the bucket containing the object")]
    pub bucket_name: String,
    #[schemars(description = "Object key (path) to delete")]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteObjectOutput {
    pub bucket_name: String,
    pub key: String,
}

pub struct DeleteObject {
    store: Arc<dyn ObjectStore>,
}

impl DeleteObject {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for DeleteObject {
    const NAME: &'static str = "delete_object";
    const TITLE: &'static str = "Delete Object";
    const DESCRIPTION: &'static str = "Deletes an object from an S3 bucket.";

    type Params = DeleteObjectParams;
    type Output = DeleteObjectOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::new().with_idempotent(true)
    }

    async fn handle(&self, params: DeleteObjectParams) -> ToolResult<DeleteObjectOutput> {
        match self
            .store
            .delete_object(&params.bucket_name, &params.key)
            .await
        {
            Ok(()) => ToolResult::Success(DeleteObjectOutput {
                bucket_name: params.bucket_name,
                key: params.key,
            }),
            Err(e) => {
                error!(bucket = %params.bucket_name, key = %params.key, error = %e, "Error deleting object");
                ToolFailure::storage(&e, "Failed to delete object")
                    .with_bucket(params.bucket_name)
                    .with_key(params.key)
                    .into()
            }
        }
    }
}
