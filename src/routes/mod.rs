//! HTTP routes for Wicket

pub mod health;
pub mod index;
pub mod upload;

pub use health::{health_check, readiness_check, version_info};
pub use index::index_page;
pub use upload::handle_upload;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::error::WicketError;

/// Serialize a value into a JSON response.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(data)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Map a gateway error onto its HTTP response.
///
/// The body names the failure kind so callers can distinguish an
/// unreachable node from a rejected add without parsing message text.
pub(crate) fn error_response(err: &WicketError) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "kind": err.kind(),
        "error": err.to_string(),
    });

    Response::builder()
        .status(err.status())
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
