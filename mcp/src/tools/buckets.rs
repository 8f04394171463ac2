//! Bucket lifecycle tools: `list_buckets`, `create_bucket`, `delete_bucket`.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{iso8601, non_empty};
use crate::{
    annotations::ToolAnnotations,
    backend::ObjectStore,
    core::{
        registry::StorageTool,
        result::{ToolFailure, ToolResult},
    },
};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListBucketsParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBucketsOutput {
    pub buckets: Vec<BucketInfo>,
    pub count: usize,
}

pub struct ListBuckets {
    store: Arc<dyn ObjectStore>,
}

impl ListBuckets {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for ListBuckets {
    const NAME: &'static str = "list_buckets";
    const TITLE: &'static str = "List Buckets";
    const DESCRIPTION: &'static str = "Lists all S3 buckets in the AWS account.";

    type Params = ListBucketsParams;
    type Output = ListBucketsOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    async fn handle(&self, _params: ListBucketsParams) -> ToolResult<ListBucketsOutput> {
        match self.store.list_buckets().await {
            Ok(buckets) => {
                let buckets: Vec<BucketInfo> = buckets
                    .into_iter()
                    .map(|b| BucketInfo {
                        name: b.name.unwrap_or_default(),
                        creation_date: b.creation_date.as_ref().map(iso8601),
                    })
                    .collect();
                ToolResult::Success(ListBucketsOutput {
                    count: buckets.len(),
                    buckets,
                })
            }
            Err(e) => {
                error!(error = %e, "Error listing buckets");
                ToolFailure::storage(&e, "Failed to list buckets").into()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketParams {
    #[schemars(
        description = "Name of the bucket to create. Must be globally unique across all AWS accounts."
    )]
    pub bucket_name: String,
    #[schemars(
        description = "AWS region where the bucket should be created. Defaults to the client's configured region."
    )]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketOutput {
    pub bucket_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub struct CreateBucket {
    store: Arc<dyn ObjectStore>,
}

impl CreateBucket {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for CreateBucket {
    const NAME: &'static str = "create_bucket";
    const TITLE: &'static str = "Create Bucket";
    const DESCRIPTION: &'static str = "Creates a new S3 bucket with the specified name.";

    type Params = CreateBucketParams;
    type Output = CreateBucketOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::new().with_destructive(false)
    }

    async fn handle(&self, params: CreateBucketParams) -> ToolResult<CreateBucketOutput> {
        let location = non_empty(params.region.as_deref());
        match self.store.create_bucket(&params.bucket_name, location).await {
            Ok(output) => ToolResult::Success(CreateBucketOutput {
                bucket_name: params.bucket_name,
                location: output.location,
            }),
            Err(e) => {
                error!(bucket = %params.bucket_name, error = %e, "Error creating bucket");
                ToolFailure::storage(&e, "Failed to create bucket").into()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBucketParams {
    #[schemars(description = "Name of the bucket to delete")]
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBucketOutput {
    pub bucket_name: String,
}

pub struct DeleteBucket {
    store: Arc<dyn ObjectStore>,
}

impl DeleteBucket {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StorageTool for DeleteBucket {
    const NAME: &'static str = "delete_bucket";
    const TITLE: &'static str = "Delete Bucket";
    const DESCRIPTION: &'static str = "Deletes an S3 bucket. The bucket must be empty.";

    type Params = DeleteBucketParams;
    type Output = DeleteBucketOutput;

    fn annotations() -> ToolAnnotations {
        ToolAnnotations::new().with_idempotent(true)
    }

    async fn handle(&self, params: DeleteBucketParams) -> ToolResult<DeleteBucketOutput> {
        // Emptiness is the backend's call (BucketNotEmpty).
        match self.store.delete_bucket(&params.bucket_name).await {
            Ok(()) => ToolResult::Success(DeleteBucketOutput {
                bucket_name: params.bucket_name,
            }),
            Err(e) => {
                error!(bucket = %params.bucket_name, error = %e, "Error deleting bucket");
                ToolFailure::storage(&e, "Failed to delete bucket")
                    .with_bucket(params.bucket_name)
                    .into()
            }
        }
    }
}
