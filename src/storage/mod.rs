//! Production storage backend.

mod aws;
mod provider;

pub use aws::{classify_service_error, to_chrono, AwsObjectStore};
pub use provider::{ClientSettings, S3ClientProvider};
