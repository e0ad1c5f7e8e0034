//! Storage node RPC client
//!
//! Speaks the node's HTTP RPC (the kubo protocol): content is submitted as
//! multipart form data to `/api/v0/add` and the node answers with the
//! identifier it derived from the bytes. `/api/v0/version` doubles as a
//! reachability probe. kubo requires POST for every RPC endpoint, including
//! version.
//!
//! The client is constructed once at startup and shared by reference;
//! configuration problems surface here, before the listener binds.

use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use reqwest::multipart;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{AddResult, ContentStore};
use crate::config::Args;
use crate::error::{Result, WicketError};

/// Client for a single storage node.
#[derive(Debug)]
pub struct KuboClient {
    http: reqwest::Client,
    base: Url,
}

/// One response line from `/api/v0/add`. kubo encodes `Size` as a string.
#[derive(Debug, serde::Deserialize)]
struct AddResponse {
    #[serde(rename = "Name")]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size")]
    size: String,
}

impl KuboClient {
    /// Build a client from startup configuration.
    pub fn new(args: &Args) -> Result<Self> {
        Self::with_timeout(&args.ipfs_url, args.request_timeout())
    }

    /// Build a client for an explicit node URL and request timeout.
    pub fn with_timeout(node_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(node_url)
            .map_err(|e| WicketError::Config(format!("invalid storage node URL: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WicketError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ContentStore for KuboClient {
    async fn add_bytes(&self, name: &str, data: Bytes) -> Result<AddResult> {
        let submitted = data.len();
        let part = multipart::Part::bytes(data.to_vec()).file_name(name.to_string());
        let form = multipart::Form::new().part("file", part);

        let url = self.endpoint("api/v0/add");
        debug!(url = %url, name = %name, size = submitted, "Submitting content to storage node");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Storage node rejected add");
            return Err(WicketError::StorageAddFailed(format!(
                "node returned {}: {}",
                status, body
            )));
        }

        let body = response.text().await.map_err(|e| {
            WicketError::StorageAddFailed(format!("failed to read add response: {}", e))
        })?;
        parse_add_response(&body)
    }

    async fn add_json(&self, value: &serde_json::Value) -> Result<AddResult> {
        // serde_json stores object keys sorted, so identical values always
        // produce identical bytes and therefore the same identifier.
        let data = serde_json::to_vec(value)?;
        self.add_bytes("metadata.json", Bytes::from(data)).await
    }

    async fn probe(&self) -> Result<()> {
        let url = self.endpoint("api/v0/version");
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(classify_transport_error)?;
        if !response.status().is_success() {
            return Err(WicketError::StorageAddFailed(format!(
                "version probe returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Map a transport error onto the storage taxonomy.
///
/// Connect and timeout failures mean the node cannot be reached; anything
/// else is a submission failure.
fn classify_transport_error(e: reqwest::Error) -> WicketError {
    if e.is_connect() || e.is_timeout() {
        WicketError::StorageUnavailable(e.to_string())
    } else {
        WicketError::StorageAddFailed(e.to_string())
    }
}

/// Parse the node's add response.
///
/// kubo streams one JSON object per line (one per wrapped entry); a
/// single-file add produces exactly one, and the last line describes the
/// submitted root either way.
fn parse_add_response(body: &str) -> Result<AddResult> {
    let line = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or_else(|| WicketError::StorageAddFailed("empty add response".to_string()))?;

    let parsed: AddResponse = serde_json::from_str(line)
        .map_err(|e| WicketError::StorageAddFailed(format!("unexpected add response: {}", e)))?;

    // The identifier must be a well-formed CID; anything else means the
    // node (or something in between) is not speaking the protocol.
    Cid::from_str(&parsed.hash).map_err(|e| {
        WicketError::StorageAddFailed(format!(
            "malformed content identifier {:?}: {}",
            parsed.hash, e
        ))
    })?;

    let size = parsed.size.parse::<u64>().map_err(|e| {
        WicketError::StorageAddFailed(format!("malformed size {:?}: {}", parsed.size, e))
    })?;

    Ok(AddResult {
        cid: parsed.hash,
        size,
    })
}
