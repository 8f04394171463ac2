//! [`ObjectStore`] backed by the AWS SDK.

use std::{error::Error as StdError, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::{ByteStream, DateTime as AwsDateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use chrono::{DateTime, TimeZone, Utc};
use s3_mcp::{
    BucketSummary, CreatedBucket, ListObjectsRequest, ObjectBody, ObjectListing, ObjectStore,
    ObjectSummary, PutObjectOutput, PutObjectRequest, StorageError, StorageResult,
};
use tracing::debug;

use super::provider::S3ClientProvider;

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";
const NOT_FOUND_CODES: [&str; 3] = ["NoSuchBucket", "NoSuchKey", "NotFound"];

pub struct AwsObjectStore {
    provider: Arc<S3ClientProvider>,
}

impl AwsObjectStore {
    pub fn new(provider: Arc<S3ClientProvider>) -> Self {
        Self { provider }
    }

    async fn client(&self) -> &Client {
        self.provider.client().await
    }
}

/// Map a service error code onto the storage error taxonomy.
pub fn classify_service_error(
    code: Option<&str>,
    message: Option<&str>,
    bucket: &str,
) -> StorageError {
    let message = message.map(str::to_string);
    match code {
        Some(NO_SUCH_BUCKET_POLICY) => StorageError::NoSuchBucketPolicy {
            bucket: bucket.to_string(),
        },
        Some(code) if NOT_FOUND_CODES.contains(&code) => StorageError::not_found(code, message),
        Some(code) => StorageError::service(code, message),
        None => StorageError::Response(
            message.unwrap_or_else(|| "Unrecognized service error".to_string()),
        ),
    }
}

fn storage_error<E, R>(err: SdkError<E, R>, bucket: &str) -> StorageError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug,
{
    match err.as_service_error() {
        Some(service) => classify_service_error(service.code(), service.message(), bucket),
        None => StorageError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

pub fn to_chrono(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(value.secs(), value.subsec_nanos()).single()
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketSummary>> {
        let output = self
            .client()
            .await
            .list_buckets()
            .send()
            .await
            .map_err(|e| storage_error(e, ""))?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().map(str::to_string),
                creation_date: bucket.creation_date().and_then(to_chrono),
            })
            .collect())
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location: Option<&str>,
    ) -> StorageResult<CreatedBucket> {
        let configuration = location.map(|region| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });
        debug!(bucket, location, "CreateBucket");

        let output = self
            .client()
            .await
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(configuration)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;

        Ok(CreatedBucket {
            location: output.location().map(str::to_string),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageResult<()> {
        debug!(bucket, "DeleteBucket");
        self.client()
            .await
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;
        Ok(())
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> StorageResult<ObjectListing> {
        debug!(
            bucket = %request.bucket,
            prefix = request.prefix.as_deref(),
            max_keys = request.max_keys,
            "ListObjectsV2"
        );
        let output = self
            .client()
            .await
            .list_objects_v2()
            .bucket(&request.bucket)
            .set_prefix(request.prefix)
            .set_max_keys(request.max_keys)
            .set_continuation_token(request.continuation_token)
            .send()
            .await
            .map_err(|e| storage_error(e, &request.bucket))?;

        let objects = output
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().map(str::to_string),
                size: object.size(),
                last_modified: object.last_modified().and_then(to_chrono),
                etag: object.e_tag().map(str::to_string),
                storage_class: object.storage_class().map(|c| c.as_str().to_string()),
            })
            .collect();

        Ok(ObjectListing {
            objects,
            is_truncated: output.is_truncated(),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<PutObjectOutput> {
        debug!(bucket = %request.bucket, key = %request.key, bytes = request.body.len(), "PutObject");
        let output = self
            .client()
            .await
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .set_content_type(request.content_type)
            .send()
            .await
            .map_err(|e| storage_error(e, &request.bucket))?;

        Ok(PutObjectOutput {
            etag: output.e_tag().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        debug!(bucket, key, "GetObject");
        let output = self
            .client()
            .await
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;

        let content_type = output.content_type().map(str::to_string);
        let content_length = output.content_length();
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Response(format!("Failed to read object body: {e}")))?
            .into_bytes();

        Ok(ObjectBody {
            data,
            content_type,
            content_length,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        debug!(bucket, key, "DeleteObject");
        self.client()
            .await
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> StorageResult<Option<String>> {
        debug!(bucket, "GetBucketPolicy");
        let output = self
            .client()
            .await
            .get_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;
        Ok(output.policy().map(str::to_string))
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageResult<()> {
        debug!(bucket, bytes = policy.len(), "PutBucketPolicy");
        self.client()
            .await
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| storage_error(e, bucket))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_policy_is_distinguished() {
        let err = classify_service_error(
            Some("NoSuchBucketPolicy"),
            Some("The bucket policy does not exist"),
            "logs",
        );
        assert!(err.is_no_such_bucket_policy());
        assert!(matches!(err, StorageError::NoSuchBucketPolicy { bucket } if bucket == "logs"));
    }

    #[test]
    fn test_not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_service_error(Some(code), Some("gone"), "b");
            assert!(matches!(err, StorageError::NotFound { .. }), "{code}");
            assert_eq!(err.message(), Some("gone"));
        }
    }

    #[test]
    fn test_other_codes_keep_service_message() {
        let err = classify_service_error(Some("AccessDenied"), Some("Access Denied"), "b");
        assert!(matches!(&err, StorageError::Service { code, .. } if code == "AccessDenied"));
        assert_eq!(err.message(), Some("Access Denied"));

        let err = classify_service_error(Some("BucketNotEmpty"), None, "b");
        assert_eq!(err.message(), None);
    }

    #[test]
    fn test_missing_code() {
        let err = classify_service_error(None, Some("bad gateway"), "b");
        assert!(matches!(err, StorageError::Response(ref m) if m == "bad gateway"));
    }

    #[test]
    fn test_to_chrono() {
        let value = AwsDateTime::from_secs_and_nanos(1_704_164_645, 250_000_000);
        let converted = to_chrono(&value).unwrap();
        assert_eq!(converted.timestamp(), 1_704_164_645);
        assert_eq!(converted.timestamp_subsec_millis(), 250);
    }
}
