// API response utility functions module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header;
use hyper::{Response, StatusCode};

use crate::logger;

/// Build the 200 response for a serialized JSON payload
pub fn json_response(json: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, json.len())
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Plain-text API error; still cross-origin readable like every `/api/` response
pub fn api_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut response = crate::http::build_error_response(status, message);
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    response
}

/// 404 for any `/api/` path without a handler
pub fn not_found() -> Response<Full<Bytes>> {
    api_error(StatusCode::NOT_FOUND, "API endpoint not found")
}
