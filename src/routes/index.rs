//! Index route
//!
//! `GET /` serves a self-contained upload page. No template engine: the
//! page is compiled in and posts straight to `/upload`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Wicket</title>
</head>
<body>
  <h1>Upload</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <p><input type="file" name="file" required></p>
    <p><input type="text" name="title" placeholder="Title"></p>
    <p><input type="text" name="description" placeholder="Description"></p>
    <p><input type="text" name="address" placeholder="Address"></p>
    <p><button type="submit">Upload</button></p>
  </form>
</body>
</html>
"#;

/// Handle GET /
pub fn index_page() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(INDEX_HTML)))
        .unwrap()
}
