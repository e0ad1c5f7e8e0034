//! Wicket - content-addressed upload gateway
//!
//! Accepts file uploads over HTTP and publishes them to an IPFS storage
//! node, answering with the content identifier the node derived from the
//! bytes.
//!
//! ## Services
//!
//! - **Upload**: `POST /upload` multipart endpoint with local staging
//! - **Storage client**: kubo HTTP RPC `add` behind the [`ContentStore`] seam
//! - **Probes**: liveness, readiness (live storage-node check), version

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod staging;
pub mod storage;

pub use config::Args;
pub use error::{Result, WicketError};
pub use server::{run, serve, AppState};
pub use storage::{AddResult, ContentStore, KuboClient};
