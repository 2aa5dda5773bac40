// API handler functions
// Each handler builds a fresh payload and serializes it to pretty JSON.

use serde::Serialize;

use super::types::{module_load_logs, HealthPayload, StatsPayload};
use super::ApiError;

/// Serialize a payload with 2-space indentation, keys in declaration order
fn to_json<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(payload)?)
}

/// GET/POST /api/stats
pub fn stats() -> Result<String, ApiError> {
    to_json(&StatsPayload::now())
}

/// GET/POST /api/logs
pub fn logs() -> Result<String, ApiError> {
    to_json(&module_load_logs())
}

/// GET/POST /api/health
pub fn health() -> Result<String, ApiError> {
    to_json(&HealthPayload::now())
}
