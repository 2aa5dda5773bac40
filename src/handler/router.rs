//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: classifies each request by method
//! and path prefix, sends `/api/` paths to the API table and everything else
//! to the static file responder.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderMap};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// Raw (still percent-encoded) path without the query string
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub has_if_none_match: bool,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let headers = req.headers();
        Self {
            method: req.method(),
            path: req.uri().path(),
            query: req.uri().query(),
            if_modified_since: header_str(headers, &header::IF_MODIFIED_SINCE),
            has_if_none_match: headers.contains_key(header::IF_NONE_MATCH),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body since no route reads it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);

    let mut response = route_request(&ctx, &state).await;
    if *ctx.method == Method::HEAD {
        response = http::strip_body(response);
    }
    http::apply_common_headers(&mut response, &state.config.http.server_name);

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }

    Ok(response)
}

/// Route request based on method and path
///
/// `HEAD` follows the `GET` route; the caller strips the body.
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match *ctx.method {
        Method::GET | Method::HEAD | Method::POST if api::is_api_path(ctx.path) => {
            api::handle_api_request(ctx.path, state.config.api.expose_errors)
        }
        Method::GET | Method::HEAD => static_files::serve(ctx, state).await,
        Method::POST => http::build_error_response(StatusCode::NOT_FOUND, "Not Found"),
        _ => {
            logger::log_warning(&format!("Unsupported method: {}", ctx.method));
            http::build_501_response(ctx.method)
        }
    }
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_str(req.headers(), &header::REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), &header::USER_AGENT).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
