//! In-memory [`ObjectStore`] for exercising the tools without a network.

#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use s3_mcp::{
    BucketSummary, CreatedBucket, ListObjectsRequest, ObjectBody, ObjectListing, ObjectStore,
    ObjectSummary, PutObjectOutput, PutObjectRequest, StorageError, StorageResult, ToolRegistry,
};

const DEFAULT_PAGE_SIZE: usize = 1000;

/// A backend request as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListBuckets,
    CreateBucket {
        bucket: String,
        location: Option<String>,
    },
    DeleteBucket(String),
    ListObjects(ListObjectsRequest),
    PutObject {
        bucket: String,
        key: String,
        body: Bytes,
        content_type: Option<String>,
    },
    GetObject {
        bucket: String,
        key: String,
    },
    DeleteObject {
        bucket: String,
        key: String,
    },
    GetBucketPolicy(String),
    PutBucketPolicy {
        bucket: String,
        policy: String,
    },
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    created: Option<DateTime<Utc>>,
    objects: BTreeMap<String, StoredObject>,
    policy: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
    calls: Mutex<Vec<Call>>,
    next_error: Mutex<Option<StorageError>>,
    version: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn registry(self: &Arc<Self>) -> ToolRegistry {
        s3_mcp::storage_registry(self.clone()).expect("storage tools register")
    }

    /// Make the next backend call fail with `err`.
    pub fn fail_next(&self, err: StorageError) {
        *self.next_error.lock() = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().last().cloned()
    }

    pub fn object_data(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.data.clone())
    }

    pub fn policy(&self, bucket: &str) -> Option<String> {
        self.buckets.lock().get(bucket).and_then(|b| b.policy.clone())
    }

    /// Seed a bucket directly, bypassing the call log.
    pub fn seed_bucket(&self, bucket: &str) {
        self.buckets.lock().entry(bucket.to_string()).or_default();
    }

    pub fn seed_object(&self, bucket: &str, key: &str, data: &[u8]) {
        let etag = self.next_etag();
        self.buckets
            .lock()
            .entry(bucket.to_string())
            .or_default()
            .objects
            .insert(
                key.to_string(),
                StoredObject {
                    data: Bytes::copy_from_slice(data),
                    content_type: None,
                    etag,
                    last_modified: fixed_time(),
                },
            );
    }

    pub fn seed_policy(&self, bucket: &str, policy: &str) {
        self.buckets
            .lock()
            .entry(bucket.to_string())
            .or_default()
            .policy = Some(policy.to_string());
    }

    fn record(&self, call: Call) -> StorageResult<()> {
        self.calls.lock().push(call);
        match self.next_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_etag(&self) -> String {
        let mut version = self.version.lock();
        *version += 1;
        format!("\"etag-{}\"", *version)
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

fn no_such_bucket() -> StorageError {
    StorageError::not_found(
        "NoSuchBucket",
        Some("The specified bucket does not exist".to_string()),
    )
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        self.record(Call::ListBuckets)?;
        Ok(self
            .buckets
            .lock()
            .iter()
            .map(|(name, bucket)| BucketSummary {
                name: Some(name.clone()),
                creation_date: bucket.created,
            })
            .collect())
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location: Option<&str>,
    ) -> StorageResult<CreatedBucket> {
        self.record(Call::CreateBucket {
            bucket: bucket.to_string(),
            location: location.map(str::to_string),
        })?;
        let mut buckets = self.buckets.lock();
        if buckets.contains_key(bucket) {
            return Err(StorageError::service(
                "BucketAlreadyOwnedByYou",
                Some("Your previous request to create the named bucket succeeded and you already own it.".to_string()),
            ));
        }
        buckets.insert(
            bucket.to_string(),
            Bucket {
                created: Some(fixed_time()),
                ..Bucket::default()
            },
        );
        Ok(CreatedBucket {
            location: Some(format!("/{bucket}")),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.record(Call::DeleteBucket(bucket.to_string()))?;
        let mut buckets = self.buckets.lock();
        match buckets.get(bucket) {
            None => Err(no_such_bucket()),
            Some(b) if !b.objects.is_empty() => Err(StorageError::service(
                "BucketNotEmpty",
                Some("The bucket you tried to delete is not empty".to_string()),
            )),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ObjectListing> {
        self.record(Call::ListObjects(request.clone()))?;
        let buckets = self.buckets.lock();
        let bucket = buckets.get(&request.bucket).ok_or_else(no_such_bucket)?;

        let page_size = request
            .max_keys
            .map_or(DEFAULT_PAGE_SIZE, |n| (n.max(0) as usize).min(DEFAULT_PAGE_SIZE));
        let start_after = request
            .continuation_token
            .as_deref()
            .map(|t| t.trim_start_matches("token:").to_string());

        let mut matching = bucket
            .objects
            .iter()
            .filter(|(key, _)| {
                request
                    .prefix
                    .as_deref()
                    .map_or(true, |prefix| key.starts_with(prefix))
            })
            .filter(|(key, _)| start_after.as_deref().map_or(true, |after| key.as_str() > after));

        let page: Vec<_> = matching.by_ref().take(page_size).collect();
        let is_truncated = matching.next().is_some();
        let next_continuation_token = if is_truncated {
            page.last().map(|(key, _)| format!("token:{key}"))
        } else {
            None
        };

        Ok(ObjectListing {
            objects: page
                .into_iter()
                .map(|(key, object)| ObjectSummary {
                    key: Some(key.clone()),
                    size: Some(object.data.len() as i64),
                    last_modified: Some(object.last_modified),
                    etag: Some(object.etag.clone()),
                    storage_class: Some("STANDARD".to_string()),
                })
                .collect(),
            is_truncated: Some(is_truncated),
            next_continuation_token,
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput> {
        self.record(Call::PutObject {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            body: request.body.clone(),
            content_type: request.content_type.clone(),
        })?;
        let etag = self.next_etag();
        let mut buckets = self.buckets.lock();
        let bucket = buckets.get_mut(&request.bucket).ok_or_else(no_such_bucket)?;
        bucket.objects.insert(
            request.key,
            StoredObject {
                data: request.body,
                content_type: request.content_type,
                etag: etag.clone(),
                last_modified: fixed_time(),
            },
        );
        Ok(PutObjectOutput { etag: Some(etag) })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        self.record(Call::GetObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        let buckets = self.buckets.lock();
        let object = buckets
            .get(bucket)
            .ok_or_else(no_such_bucket)?
            .objects
            .get(key)
            .ok_or_else(|| {
                StorageError::not_found(
                    "NoSuchKey",
                    Some("The specified key does not exist.".to_string()),
                )
            })?;
        Ok(ObjectBody {
            data: object.data.clone(),
            content_type: Some(
                object
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            ),
            content_length: Some(object.data.len() as i64),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.record(Call::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        let mut buckets = self.buckets.lock();
        let bucket = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;
        bucket.objects.remove(key);
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        self.record(Call::GetBucketPolicy(bucket.to_string()))?;
        let buckets = self.buckets.lock();
        let stored = buckets.get(bucket).ok_or_else(no_such_bucket)?;
        match &stored.policy {
            Some(policy) => Ok(Some(policy.clone())),
            None => Err(StorageError::NoSuchBucketPolicy {
                bucket: bucket.to_string(),
            }),
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        self.record(Call::PutBucketPolicy {
            bucket: bucket.to_string(),
            policy: policy.to_string(),
        })?;
        let mut buckets = self.buckets.lock();
        let stored = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;
        stored.policy = Some(policy.to_string());
        Ok(())
    }
}
