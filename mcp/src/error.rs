//! Error types for the tool layer.
//!
//! [`McpError`] covers protocol-level failures raised by the registry and
//! dispatcher. [`StorageError`] is what an [`ObjectStore`](crate::ObjectStore)
//! reports; handlers fold it into a failed tool result instead of propagating.

use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool name collision: '{0}' is already registered")]
    ToolCollision(String),

    #[error("Invalid arguments for '{tool_name}': {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Schema generation failed for '{0}'")]
    Schema(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<McpError> for rmcp::ErrorData {
    fn from(err: McpError) -> Self {
        match &err {
            McpError::ToolNotFound(_) | McpError::InvalidArguments { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            McpError::ToolCollision(_) | McpError::Schema(_) | McpError::Serialization(_) => {
                rmcp::ErrorData::internal_error(err.to_string(), None)
            }
        }
    }
}

/// Errors reported by the storage backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The bucket exists but has no policy attached.
    #[error("The bucket policy does not exist: {bucket}")]
    NoSuchBucketPolicy { bucket: String },

    /// Bucket or key does not exist.
    #[error("{code}: {}", .message.as_deref().unwrap_or("resource not found"))]
    NotFound {
        code: String,
        message: Option<String>,
    },

    /// Any other error returned by the service (auth, conflict, throttling).
    #[error("{code}: {}", .message.as_deref().unwrap_or("service error"))]
    Service {
        code: String,
        message: Option<String>,
    },

    /// The request never produced a service response (DNS, TLS, timeout, credentials).
    #[error("{0}")]
    Transport(String),

    /// The service responded but the body could not be read or understood.
    #[error("{0}")]
    Response(String),
}

impl StorageError {
    pub fn service(code: impl Into<String>, message: Option<String>) -> Self {
        StorageError::Service {
            code: code.into(),
            message,
        }
    }

    pub fn not_found(code: impl Into<String>, message: Option<String>) -> Self {
        StorageError::NotFound {
            code: code.into(),
            message,
        }
    }

    /// Message reported back to tool callers, when the backend supplied one.
    pub fn message(&self) -> Option<&str> {
        let msg = match self {
            StorageError::NoSuchBucketPolicy { .. } => {
                Some("The bucket policy does not exist")
            }
            StorageError::NotFound { message, .. } | StorageError::Service { message, .. } => {
                message.as_deref()
            }
            StorageError::Transport(msg) | StorageError::Response(msg) => Some(msg.as_str()),
        };
        msg.filter(|m| !m.trim().is_empty())
    }

    pub fn is_no_such_bucket_policy(&self) -> bool {
        matches!(self, StorageError::NoSuchBucketPolicy { .. })
    }
}
