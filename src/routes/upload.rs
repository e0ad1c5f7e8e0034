//! Upload route
//!
//! `POST /upload` accepts a multipart form with a `file` part plus optional
//! `title`, `description` and `address` fields, stages the payload locally,
//! submits it to the storage node and answers with the assigned content
//! identifier. The metadata record is published to the network alongside
//! the file, so an upload is fully recoverable by identifier alone.
//!
//! ## Flow
//!
//! ```text
//! Client → POST /upload → parse multipart → stage to disk
//!                                             ├── add file     → cid
//!                                             └── add metadata → metadata_cid
//! ```
//!
//! Every failure is logged and answered; nothing is swallowed. Requests
//! without a file part get the exact body existing clients match on.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::Stream;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, WicketError};
use crate::server::AppState;
use crate::staging::StagedFile;

use super::{error_response, json_response};

/// Body sent verbatim when a request carries no file part.
pub const NO_FILES_BODY: &str = "No files were uploaded.";

/// Metadata record published to the storage network once the file add
/// succeeds. `address` is an opaque caller-supplied string; the gateway
/// attaches no semantics to it.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    /// Content identifier of the uploaded file
    pub cid: String,
    /// Declared file name
    pub name: String,
    /// Size of the uploaded payload in bytes
    pub size: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Content identifier of the uploaded file
    pub cid: String,
    /// Identifier of the published metadata record
    pub metadata_cid: String,
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields extracted from the multipart body.
#[derive(Debug, Default)]
struct ParsedUpload {
    file_name: Option<String>,
    data: Option<Vec<u8>>,
    title: Option<String>,
    description: Option<String>,
    address: Option<String>,
}

/// Handle POST /upload
pub async fn handle_upload(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let boundary = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok());

    // A request that is not multipart cannot carry a file part.
    let Some(boundary) = boundary else {
        return no_files_response();
    };

    let stream = req.into_body().into_data_stream();
    let parsed = match read_multipart(stream, boundary, state.args.max_upload_bytes).await {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejected upload request");
            return error_response(&e);
        }
    };

    let (file_name, data) = match (parsed.file_name, parsed.data) {
        (Some(name), Some(data)) if !name.trim().is_empty() => (name, data),
        (None, None) => return no_files_response(),
        _ => {
            let e = WicketError::Validation("file part must carry a non-empty name".to_string());
            warn!(error = %e, "Rejected upload request");
            return error_response(&e);
        }
    };

    if data.is_empty() {
        let e = WicketError::Validation("uploaded file is empty".to_string());
        warn!(name = %file_name, error = %e, "Rejected upload request");
        return error_response(&e);
    }

    match process_upload(
        &state,
        &file_name,
        data,
        parsed.title,
        parsed.description,
        parsed.address,
    )
    .await
    {
        Ok(response) => {
            info!(
                cid = %response.cid,
                metadata_cid = %response.metadata_cid,
                name = %response.name,
                size = response.size,
                "Upload published"
            );
            json_response(StatusCode::OK, &response)
        }
        Err(e) => {
            warn!(name = %file_name, kind = e.kind(), error = %e, "Upload failed");
            error_response(&e)
        }
    }
}

/// Stage the payload, submit it, publish the metadata record.
///
/// The staged file is removed whatever the submission outcome.
async fn process_upload(
    state: &AppState,
    declared_name: &str,
    data: Vec<u8>,
    title: Option<String>,
    description: Option<String>,
    address: Option<String>,
) -> Result<UploadResponse> {
    let payload_size = data.len() as u64;
    let staged = state.staging.stage(declared_name, &data).await?;

    let result = submit_staged(state, &staged, payload_size, title, description, address).await;
    staged.discard().await;
    result
}

async fn submit_staged(
    state: &AppState,
    staged: &StagedFile,
    payload_size: u64,
    title: Option<String>,
    description: Option<String>,
    address: Option<String>,
) -> Result<UploadResponse> {
    let added = state.store.add_file(&staged.path).await?;

    let record = UploadRecord {
        cid: added.cid,
        name: staged.name.clone(),
        size: payload_size,
        title,
        description,
        address,
        uploaded_at: Utc::now(),
    };

    let metadata = state
        .store
        .add_json(&serde_json::to_value(&record)?)
        .await?;

    Ok(UploadResponse {
        success: true,
        cid: record.cid,
        metadata_cid: metadata.cid,
        name: record.name,
        size: record.size,
        uploaded_at: record.uploaded_at,
    })
}

/// Read the multipart body, collecting the file payload and form fields.
///
/// The size cap is enforced while chunks arrive, so an oversized upload is
/// rejected without buffering the whole body first. Unknown parts are
/// drained and ignored.
async fn read_multipart<S, E>(stream: S, boundary: String, max_bytes: u64) -> Result<ParsedUpload>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut parsed = ParsedUpload::default();

    while let Some(mut field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                if parsed.data.is_some() {
                    return Err(WicketError::Validation(
                        "multiple file parts are not supported".to_string(),
                    ));
                }
                parsed.file_name = field.file_name().map(str::to_string);

                let mut data: Vec<u8> = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(invalid_multipart)? {
                    let size = data.len() as u64 + chunk.len() as u64;
                    if size > max_bytes {
                        return Err(WicketError::PayloadTooLarge {
                            size,
                            limit: max_bytes,
                        });
                    }
                    data.extend_from_slice(&chunk);
                }
                parsed.data = Some(data);
            }
            Some("title") => parsed.title = text_field(field, "title").await?,
            Some("description") => parsed.description = text_field(field, "description").await?,
            Some("address") => parsed.address = text_field(field, "address").await?,
            _ => drain_field(field).await?,
        }
    }

    Ok(parsed)
}

/// Read a text form field, treating blank values as absent.
async fn text_field(field: multer::Field<'static>, name: &str) -> Result<Option<String>> {
    let value = field
        .text()
        .await
        .map_err(|e| WicketError::Validation(format!("invalid {} field: {}", name, e)))?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

async fn drain_field(mut field: multer::Field<'static>) -> Result<()> {
    while field.chunk().await.map_err(invalid_multipart)?.is_some() {}
    Ok(())
}

fn invalid_multipart(e: multer::Error) -> WicketError {
    WicketError::Validation(format!("malformed multipart body: {}", e))
}

fn no_files_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(NO_FILES_BODY)))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    const BOUNDARY: &str = "test-boundary";

    fn once_stream(
        body: String,
    ) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> + Send + 'static {
        stream::once(async move { Ok(Bytes::from(body)) })
    }

    fn file_part(name: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        )
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn closing() -> String {
        format!("--{BOUNDARY}--\r\n")
    }

    #[tokio::test]
    async fn test_read_multipart_extracts_all_fields() {
        let body = format!(
            "{}{}{}{}{}",
            file_part("report.pdf", "quarterly numbers"),
            text_part("title", "Report"),
            text_part("description", "Q1"),
            text_part("address", "0xABC"),
            closing()
        );

        let parsed = read_multipart(once_stream(body), BOUNDARY.to_string(), 1024)
            .await
            .unwrap();
        assert_eq!(parsed.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(parsed.data.as_deref(), Some(b"quarterly numbers".as_ref()));
        assert_eq!(parsed.title.as_deref(), Some("Report"));
        assert_eq!(parsed.description.as_deref(), Some("Q1"));
        assert_eq!(parsed.address.as_deref(), Some("0xABC"));
    }

    #[tokio::test]
    async fn test_read_multipart_without_file_part() {
        let body = format!("{}{}", text_part("title", "Report"), closing());

        let parsed = read_multipart(once_stream(body), BOUNDARY.to_string(), 1024)
            .await
            .unwrap();
        assert!(parsed.file_name.is_none());
        assert!(parsed.data.is_none());
        assert_eq!(parsed.title.as_deref(), Some("Report"));
    }

    #[tokio::test]
    async fn test_read_multipart_enforces_size_cap() {
        let body = format!("{}{}", file_part("big.bin", "0123456789"), closing());

        let err = read_multipart(once_stream(body), BOUNDARY.to_string(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, WicketError::PayloadTooLarge { limit: 5, .. }));
    }

    #[tokio::test]
    async fn test_read_multipart_rejects_second_file_part() {
        let body = format!(
            "{}{}{}",
            file_part("a.bin", "aaa"),
            file_part("b.bin", "bbb"),
            closing()
        );

        let err = read_multipart(once_stream(body), BOUNDARY.to_string(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, WicketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_read_multipart_ignores_unknown_fields() {
        let body = format!(
            "{}{}{}",
            file_part("a.bin", "aaa"),
            text_part("unexpected", "whatever"),
            closing()
        );

        let parsed = read_multipart(once_stream(body), BOUNDARY.to_string(), 1024)
            .await
            .unwrap();
        assert_eq!(parsed.data.as_deref(), Some(b"aaa".as_ref()));
    }

    #[tokio::test]
    async fn test_blank_text_fields_are_absent() {
        let body = format!(
            "{}{}{}",
            file_part("a.bin", "aaa"),
            text_part("title", "   "),
            closing()
        );

        let parsed = read_multipart(once_stream(body), BOUNDARY.to_string(), 1024)
            .await
            .unwrap();
        assert!(parsed.title.is_none());
    }

    #[test]
    fn test_no_files_body_is_exact() {
        // Compatibility contract: existing clients match on this text.
        assert_eq!(NO_FILES_BODY, "No files were uploaded.");
    }

    #[test]
    fn test_record_serializes_with_sorted_keys() {
        let record = UploadRecord {
            cid: "bafkreigh2akiscaildc".to_string(),
            name: "report.pdf".to_string(),
            size: 17,
            title: Some("Report".to_string()),
            description: Some("Q1".to_string()),
            address: Some("0xABC".to_string()),
            uploaded_at: Utc::now(),
        };

        // Going through Value sorts object keys, which is what keeps the
        // published record's identifier stable for equal content.
        let value = serde_json::to_value(&record).unwrap();
        let encoded = String::from_utf8(serde_json::to_vec(&value).unwrap()).unwrap();
        let address_at = encoded.find("\"address\"").unwrap();
        let cid_at = encoded.find("\"cid\"").unwrap();
        let uploaded_at_at = encoded.find("\"uploaded_at\"").unwrap();
        assert!(address_at < cid_at);
        assert!(cid_at < uploaded_at_at);
    }
}
