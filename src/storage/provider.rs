//! Lazily constructed, process-wide S3 client.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::ServerConfig;

/// Settings read once, when the client is first built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

impl ClientSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            region: config.effective_region(),
            endpoint_url: config.endpoint_url().map(str::to_string),
            force_path_style: config.force_path_style,
        }
    }
}

/// Hands out one shared [`Client`].
///
/// Construction does not touch credentials; resolution failures surface on
/// the first real request.
pub struct S3ClientProvider {
    settings: ClientSettings,
    client: OnceCell<Client>,
}

impl S3ClientProvider {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// The shared client, built on first use.
    pub async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| build_client(&self.settings))
            .await
    }
}

async fn build_client(settings: &ClientSettings) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
    if let Some(endpoint) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(settings.force_path_style)
        .build();

    info!(
        region = %settings.region,
        endpoint = settings.endpoint_url.as_deref().unwrap_or("default"),
        force_path_style = settings.force_path_style,
        "S3 client initialized"
    );
    Client::from_conf(s3_config)
}
