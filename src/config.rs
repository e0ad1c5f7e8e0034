//! Configuration for Wicket
//!
//! CLI arguments and environment variable handling using clap.
//! The storage node URL has no default: startup fails with a clear
//! diagnostic when it is absent or malformed, rather than failing on the
//! first upload.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Wicket - content-addressed upload gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "wicket")]
#[command(about = "HTTP upload gateway for an IPFS storage node")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3100")]
    pub listen: SocketAddr,

    /// Storage node RPC URL (kubo HTTP API, e.g. http://127.0.0.1:5001)
    #[arg(long, env = "IPFS_URL")]
    pub ipfs_url: String,

    /// Directory where uploads are staged before submission
    #[arg(long, env = "STAGING_DIR", default_value = "files")]
    pub staging_dir: PathBuf,

    /// Storage request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "104857600")]
    pub max_upload_bytes: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Storage request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.ipfs_url)
            .map_err(|e| format!("IPFS_URL is not a valid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!(
                "IPFS_URL must use http or https, got {}",
                parsed.scheme()
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }
        Ok(())
    }
}
