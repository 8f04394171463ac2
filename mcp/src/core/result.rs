//! Uniform tool result envelope.
//!
//! Every handler returns a [`ToolResult`]. On the wire it is a flat JSON object
//! whose `success` flag always agrees with the presence of `error`:
//!
//! ```json
//! { "success": true, "bucketName": "b", "key": "k", "etag": "\"abc\"" }
//! { "success": false, "bucketName": "b", "error": "Access Denied" }
//! ```

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult<T> {
    Success(T),
    Failure(ToolFailure),
}

impl<T> ToolResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ToolResult::Success(payload) => Some(payload),
            ToolResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            ToolResult::Success(_) => None,
            ToolResult::Failure(failure) => Some(failure),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.failure().map(|f| f.error.as_str())
    }
}

impl<T: Serialize> ToolResult<T> {
    /// Erase the payload type so results from different tools share one type.
    pub fn into_json(self) -> Result<ToolResult<Value>, serde_json::Error> {
        Ok(match self {
            ToolResult::Success(payload) => ToolResult::Success(serde_json::to_value(payload)?),
            ToolResult::Failure(failure) => ToolResult::Failure(failure),
        })
    }
}

impl<T> From<ToolFailure> for ToolResult<T> {
    fn from(failure: ToolFailure) -> Self {
        ToolResult::Failure(failure)
    }
}

impl<T: Serialize> Serialize for ToolResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a, P> {
            success: bool,
            #[serde(flatten)]
            payload: &'a P,
        }

        match self {
            ToolResult::Success(payload) => Envelope {
                success: true,
                payload,
            }
            .serialize(serializer),
            ToolResult::Failure(failure) => failure.serialize(serializer),
        }
    }
}

/// Failure half of a [`ToolResult`].
///
/// `bucket_name` and `key` echo the identifying parameters for the tools that
/// report them; they never carry operation output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub error: String,
    pub bucket_name: Option<String>,
    pub key: Option<String>,
}

impl ToolFailure {
    /// Local validation failure with a fixed message.
    pub fn validation(message: &str) -> Self {
        Self {
            error: message.to_string(),
            bucket_name: None,
            key: None,
        }
    }

    /// Backend failure, falling back to `fallback` when the backend gave no message.
    pub fn storage(err: &StorageError, fallback: &str) -> Self {
        Self::with_fallback(err.message(), fallback)
    }

    /// Local file I/O failure.
    pub fn io(err: &std::io::Error, fallback: &str) -> Self {
        let message = err.to_string();
        Self::with_fallback(Some(message.as_str()), fallback)
    }

    fn with_fallback(message: Option<&str>, fallback: &str) -> Self {
        let error = match message {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => fallback.to_string(),
        };
        Self {
            error,
            bucket_name: None,
            key: None,
        }
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket_name: impl Into<String>) -> Self {
        self.bucket_name = Some(bucket_name.into());
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl Serialize for ToolFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.bucket_name.is_some()) + usize::from(self.key.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("success", &false)?;
        if let Some(bucket_name) = &self.bucket_name {
            map.serialize_entry("bucketName", bucket_name)?;
        }
        if let Some(key) = &self.key {
            map.serialize_entry("key", key)?;
        }
        map.serialize_entry("error", &self.error)?;
        map.end()
    }
}
