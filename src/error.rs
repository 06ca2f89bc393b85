//! Failure taxonomy for a single publish run.
//!
//! Every remote call returns its own error type so the workflow can tell a
//! listing failure from a rejected upload or a failed publish. `RunError`
//! aggregates them and decides the process exit code.

use std::process::ExitCode;
use thiserror::Error;

use crate::publisher::ContainerId;

/// One failed call against a remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("{endpoint}: undecodable response ({source}): {body}")]
    Decode {
        endpoint: &'static str,
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint}: response has no `{field}`: {body}")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
        body: String,
    },
}

impl ApiError {
    pub(crate) fn transport(endpoint: &'static str, source: ureq::Error) -> Self {
        ApiError::Transport {
            endpoint,
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("invalid storage credentials: {0}")]
    Credentials(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not sign the service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("storage authentication failed: {0}")]
    Auth(#[source] ApiError),
    #[error("listing folder {folder_id} failed: {source}")]
    List {
        folder_id: String,
        #[source]
        source: ApiError,
    },
    #[error("deleting source {file_id} failed: {source}")]
    Delete {
        file_id: String,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Error)]
#[error("container creation failed: {0}")]
pub struct UploadError(#[from] pub ApiError);

#[derive(Debug, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(#[from] pub ApiError);

#[derive(Debug, Error)]
#[error(
    "container {container_id} not ready after {attempts} attempts (last status: {})",
    .last_status.as_deref().unwrap_or("unknown")
)]
pub struct TimeoutError {
    pub container_id: ContainerId,
    pub attempts: u32,
    pub last_status: Option<String>,
}

/// Terminal failure of a run. Every variant stops the workflow at the step
/// that produced it.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl RunError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunError::Config(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}
