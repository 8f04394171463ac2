//! Storage backend boundary.
//!
//! Tool handlers only talk to an [`ObjectStore`]. The server binary plugs in an
//! implementation backed by the AWS SDK; tests use an in-memory store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::StorageResult;

/// Bucket entry returned by [`ObjectStore::list_buckets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

/// One object in a listing page, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: Option<String>,
    pub size: Option<i64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub storage_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub max_keys: Option<i32>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: Option<bool>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedBucket {
    pub location: Option<String>,
}

/// Fully buffered object body with the response headers handlers report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectBody {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

/// The nine backend operations the tool surface needs.
///
/// Every method is a single request. Implementations must report a missing
/// bucket policy as [`StorageError::NoSuchBucketPolicy`](crate::StorageError)
/// so callers can tell it apart from real failures.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>>;

    /// `location` is the location constraint; `None` uses the client region.
    async fn create_bucket(
        &self,
        bucket: &str,
        location: Option<&str>,
    ) -> StorageResult<CreatedBucket>;

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()>;

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ObjectListing>;

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput>;

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody>;

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Returns the raw policy document, `None` if the backend sent an empty body.
    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()>;
}
