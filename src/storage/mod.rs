//! Storage-client abstraction for the content-addressed storage network
//!
//! [`ContentStore`] is the seam the HTTP handlers depend on; [`KuboClient`]
//! is the concrete client speaking the storage node's HTTP RPC. Handlers
//! hold an `Arc<dyn ContentStore>`, so tests can substitute a deterministic
//! in-memory store without touching the network.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

pub mod client;

pub use client::KuboClient;

/// Result of adding content to the storage network.
///
/// The identifier is derived from the content's bytes by the node, so it is
/// stable across repeated adds of the same content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResult {
    /// Content identifier assigned by the node
    pub cid: String,
    /// Size reported by the node, in bytes
    pub size: u64,
}

/// Single point of contact with the content-addressed storage network.
///
/// Submitting identical bytes twice yields the same identifier, though each
/// call is a fresh round trip; no local dedup cache is kept.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Submit in-memory bytes under a declared name.
    async fn add_bytes(&self, name: &str, data: Bytes) -> Result<AddResult>;

    /// Serialize a value to canonical JSON (sorted object keys) and submit
    /// it as `add_bytes` would.
    async fn add_json(&self, value: &serde_json::Value) -> Result<AddResult>;

    /// Read a staged file and submit its content under the file's name.
    async fn add_file(&self, path: &Path) -> Result<AddResult> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        self.add_bytes(&name, Bytes::from(data)).await
    }

    /// Check that the storage node is reachable.
    async fn probe(&self) -> Result<()>;
}
