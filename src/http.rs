//! Blocking HTTP plumbing shared by the store and publisher clients.
//!
//! Non-2xx statuses are returned as ordinary responses so the raw error
//! payload of the remote service can be reported verbatim.

use serde::de::DeserializeOwned;
use std::time::Duration;
use ureq::http::Response;
use ureq::{Agent, Body};

use crate::error::ApiError;
use crate::util::payload_snippet;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Status code and body text of a completed exchange.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn read_response(
    endpoint: &'static str,
    result: Result<Response<Body>, ureq::Error>,
) -> Result<RawResponse, ApiError> {
    let mut response = result.map_err(|err| ApiError::transport(endpoint, err))?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|err| ApiError::transport(endpoint, err))?;
    tracing::debug!(endpoint, status, body_bytes = body.len(), "http response");
    Ok(RawResponse { status, body })
}

/// Decode a successful JSON response, or turn a failed one into `ApiError::Status`.
pub fn decode_json<T: DeserializeOwned>(
    endpoint: &'static str,
    raw: &RawResponse,
) -> Result<T, ApiError> {
    if !raw.is_success() {
        return Err(ApiError::Status {
            endpoint,
            status: raw.status,
            body: payload_snippet(&raw.body),
        });
    }
    serde_json::from_str(&raw.body).map_err(|source| ApiError::Decode {
        endpoint,
        body: payload_snippet(&raw.body),
        source,
    })
}

/// Extract a required non-empty string field, reporting the raw payload if absent.
pub fn require_field(
    endpoint: &'static str,
    field: &'static str,
    value: Option<String>,
    raw: &RawResponse,
) -> Result<String, ApiError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::MissingField {
            endpoint,
            field,
            body: payload_snippet(&raw.body),
        })
}
