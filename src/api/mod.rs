// API module entry
// Simulated character device telemetry endpoints

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::any::Any;
use std::panic;
use thiserror::Error;

use crate::logger;

/// Prefix that sends a request to the API instead of the static responder
pub const API_PREFIX: &str = "/api/";

/// Failure while producing an API payload
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Panicked(String),
}

type EndpointHandler = fn() -> Result<String, ApiError>;

/// A fixed API path and the handler producing its JSON body
pub struct Endpoint {
    pub path: &'static str,
    /// Name shown in the startup banner
    pub label: &'static str,
    handler: EndpointHandler,
}

/// Every endpoint the simulator serves, matched exactly and case-sensitively
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        path: "/api/stats",
        label: "Statistics API",
        handler: handlers::stats,
    },
    Endpoint {
        path: "/api/logs",
        label: "Kernel Logs API",
        handler: handlers::logs,
    },
    Endpoint {
        path: "/api/health",
        label: "Health Check",
        handler: handlers::health,
    },
];

pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// `(label, path)` pairs for the startup banner, in table order
pub fn endpoint_labels() -> Vec<(&'static str, &'static str)> {
    ENDPOINTS.iter().map(|e| (e.label, e.path)).collect()
}

fn find_endpoint(path: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.path == path)
}

/// API route handler
///
/// Any method reaches the same handler; the query string is ignored.
/// A handler error or panic becomes a 500 whose body includes the failure
/// text when `expose_errors` is set.
pub fn handle_api_request(path: &str, expose_errors: bool) -> Response<Full<Bytes>> {
    let Some(endpoint) = find_endpoint(path) else {
        logger::log_debug(&format!("No API endpoint for {path}"));
        return response::not_found();
    };

    render(path, run_handler(endpoint.handler), expose_errors)
}

fn render(
    path: &str,
    result: Result<String, ApiError>,
    expose_errors: bool,
) -> Response<Full<Bytes>> {
    match result {
        Ok(json) => response::json_response(json),
        Err(e) => {
            logger::log_error(&format!("API handler for {path} failed: {e}"));
            let message = if expose_errors {
                format!("Internal server error: {e}")
            } else {
                "Internal server error".to_string()
            };
            response::api_error(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

/// Run a handler, turning a panic into `ApiError::Panicked`
fn run_handler(handler: EndpointHandler) -> Result<String, ApiError> {
    panic::catch_unwind(handler)
        .unwrap_or_else(|payload| Err(ApiError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header;

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(
            endpoint_labels(),
            vec![
                ("Statistics API", "/api/stats"),
                ("Kernel Logs API", "/api/logs"),
                ("Health Check", "/api/health"),
            ]
        );
    }

    #[test]
    fn test_api_prefix() {
        assert!(is_api_path("/api/stats"));
        assert!(is_api_path("/api/"));
        assert!(!is_api_path("/api"));
        assert!(!is_api_path("/apistats"));
        assert!(!is_api_path("/index.html"));
    }

    #[tokio::test]
    async fn test_known_endpoints() {
        for (_, path) in endpoint_labels() {
            let resp = handle_api_request(path, true);
            assert_eq!(resp.status(), StatusCode::OK, "{path}");
            assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
            assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let length: usize = resp.headers()[header::CONTENT_LENGTH]
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            let body = body_string(resp).await;
            assert_eq!(body.len(), length);
            assert!(serde_json::from_str::<serde_json::Value>(&body).is_ok());
        }
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        for path in ["/api/", "/api/status", "/api/Stats", "/api/stats/", "/api/health/extra"] {
            let resp = handle_api_request(path, true);
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
            assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(body_string(resp).await, "API endpoint not found");
        }
    }

    fn exploding_handler() -> Result<String, ApiError> {
        panic!("device buffer corrupted")
    }

    #[test]
    fn test_panic_becomes_error() {
        let err = run_handler(exploding_handler).unwrap_err();
        assert!(matches!(err, ApiError::Panicked(_)));
        assert_eq!(err.to_string(), "device buffer corrupted");
    }

    #[tokio::test]
    async fn test_failure_renders_500() {
        let err = run_handler(exploding_handler).unwrap_err();
        let resp = render("/api/stats", Err(err), true);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            body_string(resp).await,
            "Internal server error: device buffer corrupted"
        );

        let err = run_handler(exploding_handler).unwrap_err();
        let resp = render("/api/stats", Err(err), false);
        assert_eq!(body_string(resp).await, "Internal server error");
    }

    #[test]
    fn test_panic_message_from_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&*payload), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*payload), "handler panicked");
    }

    #[test]
    fn test_run_handler_passes_through() {
        let json = run_handler(handlers::health).unwrap();
        assert!(json.contains("\"healthy\""));
    }
}
