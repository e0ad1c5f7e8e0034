//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - liveness (is the gateway running?)
//! - /ready, /readyz - readiness (can the storage node be reached?)
//!
//! Liveness always answers 200 while the process serves requests.
//! Readiness performs a live probe against the storage node, so load
//! balancers stop routing uploads that could only end in 502.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::server::AppState;

use super::json_response;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub storage: StorageHealth,
}

/// Storage node reachability details
#[derive(Serialize)]
pub struct StorageHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

/// Handle readiness probe (/ready, /readyz)
///
/// Returns 200 only when the storage node answers the probe; 503
/// otherwise. Uploads accepted while not ready would fail with 502 anyway.
pub async fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    match state.store.probe().await {
        Ok(()) => json_response(
            StatusCode::OK,
            &ReadyResponse {
                ready: true,
                storage: StorageHealth {
                    reachable: true,
                    error: None,
                },
            },
        ),
        Err(e) => {
            warn!(error = %e, "Storage node probe failed");
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &ReadyResponse {
                    ready: false,
                    storage: StorageHealth {
                        reachable: false,
                        error: Some(e.to_string()),
                    },
                },
            )
        }
    }
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            service: "wicket",
        },
    )
}
