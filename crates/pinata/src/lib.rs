//! Pinata IPFS pinning client
//!
//! Uploads binary files and JSON documents to IPFS through the Pinata
//! pinning API and returns `ipfs://<hash>` URIs. A failed pin is surfaced
//! to the caller, never retried here.

mod error;

pub use error::{PinningError, Result};

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{debug, info};

/// Configuration for the Pinata pinning API
#[derive(Debug, Clone)]
pub struct PinataConfig {
    /// Base URL of the pinning API
    pub api_url: String,
    /// Base URL of the public gateway used to render `ipfs://` URIs
    pub gateway_url: String,
    /// Bearer JWT for authentication
    pub jwt: String,
}

impl PinataConfig {
    pub fn new(jwt: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.pinata.cloud".to_string(),
            gateway_url: "https://gateway.pinata.cloud/ipfs/".to_string(),
            jwt: jwt.into(),
        }
    }
}

/// Shape of a successful pin response
#[derive(Debug, serde::Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

/// Abstraction over content pinning so workflows can take fakes in tests
#[async_trait]
pub trait Pinning: Send + Sync {
    /// Pin raw file bytes, returning an `ipfs://` URI
    async fn pin_file(&self, data: Vec<u8>, filename: &str, content_type: &str) -> Result<String>;

    /// Pin a JSON document under a human-readable pin name,
    /// returning an `ipfs://` URI
    async fn pin_json(&self, content: Value, name: &str) -> Result<String>;
}

/// HTTP client for the Pinata pinning API
pub struct PinataClient {
    config: PinataConfig,
    client: reqwest::Client,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Map an `ipfs://` URI to a fetchable gateway URL
    pub fn gateway_url(&self, uri: &str) -> String {
        match uri.strip_prefix("ipfs://") {
            Some(hash) => format!("{}{}", self.config.gateway_url, hash),
            None => uri.to_string(),
        }
    }

    async fn decode_pin_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PinningError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: PinResponse = response.json().await?;
        let hash = body.ipfs_hash.ok_or(PinningError::MissingHash)?;
        Ok(format!("ipfs://{}", hash))
    }
}

#[async_trait]
impl Pinning for PinataClient {
    async fn pin_file(&self, data: Vec<u8>, filename: &str, content_type: &str) -> Result<String> {
        info!("Pinning file {} ({} bytes)", filename, data.len());
        let start = Instant::now();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(PinningError::Http)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.config.api_url))
            .bearer_auth(&self.config.jwt)
            .multipart(form)
            .send()
            .await?;

        let uri = self.decode_pin_response(response).await?;
        debug!("File pinned in {:?}: {}", start.elapsed(), uri);
        Ok(uri)
    }

    async fn pin_json(&self, content: Value, name: &str) -> Result<String> {
        info!("Pinning JSON document {}", name);
        let start = Instant::now();

        // Pinata wraps the document in a pinataContent envelope
        let body = json!({
            "pinataContent": content,
            "pinataMetadata": { "name": name },
        });

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.config.api_url))
            .bearer_auth(&self.config.jwt)
            .json(&body)
            .send()
            .await?;

        let uri = self.decode_pin_response(response).await?;
        debug!("JSON pinned in {:?}: {}", start.elapsed(), uri);
        Ok(uri)
    }
}
