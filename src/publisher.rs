//! Publishing service client (Instagram Graph API reels flow).
//!
//! A reel goes through three calls: create a media container pointing at a
//! public video URL, poll the container until processing finishes, then
//! publish it.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use ureq::Agent;

use crate::error::{ApiError, PublishError, UploadError};
use crate::http::{decode_json, read_response, require_field, RawResponse};

pub const GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_VERSION: &str = "v19.0";
pub const REELS_MEDIA_TYPE: &str = "REELS";
/// Status string the service reports once a container can be published.
pub const FINISHED_STATUS: &str = "FINISHED";

/// Handle for an in-progress upload issued by the publishing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationId(String);

impl PublicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw `status_code` reported for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus(String);

impl ContainerStatus {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn is_finished(&self) -> bool {
        self.0 == FINISHED_STATUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub trait PublishingService {
    fn create_container(
        &self,
        download_ref: &str,
        caption: &str,
    ) -> Result<ContainerId, UploadError>;

    fn container_status(&self, container_id: &ContainerId) -> Result<ContainerStatus, ApiError>;

    fn publish(&self, container_id: &ContainerId) -> Result<PublicationId, PublishError>;
}

#[derive(Deserialize)]
struct IdBody {
    id: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    status_code: Option<String>,
}

pub struct GraphPublisher {
    agent: Agent,
    base_url: String,
    account_id: String,
    access_token: SecretString,
}

impl GraphPublisher {
    pub fn new(agent: Agent, api_version: &str, account_id: &str, access_token: SecretString) -> Self {
        Self {
            agent,
            base_url: format!("{GRAPH_BASE_URL}/{api_version}"),
            account_id: account_id.to_string(),
            access_token,
        }
    }

    fn account_url(&self, edge: &str) -> String {
        format!("{}/{}/{edge}", self.base_url, self.account_id)
    }
}

impl PublishingService for GraphPublisher {
    fn create_container(
        &self,
        download_ref: &str,
        caption: &str,
    ) -> Result<ContainerId, UploadError> {
        const ENDPOINT: &str = "create container";
        let raw = read_response(
            ENDPOINT,
            self.agent.post(self.account_url("media")).send_form([
                ("media_type", REELS_MEDIA_TYPE),
                ("video_url", download_ref),
                ("caption", caption),
                ("access_token", self.access_token.expose_secret()),
            ]),
        )?;
        Ok(parse_container_response(ENDPOINT, &raw)?)
    }

    fn container_status(&self, container_id: &ContainerId) -> Result<ContainerStatus, ApiError> {
        const ENDPOINT: &str = "container status";
        let raw = read_response(
            ENDPOINT,
            self.agent
                .get(format!("{}/{}", self.base_url, container_id))
                .query("fields", "status_code")
                .query("access_token", self.access_token.expose_secret())
                .call(),
        )?;
        parse_status_response(ENDPOINT, &raw)
    }

    fn publish(&self, container_id: &ContainerId) -> Result<PublicationId, PublishError> {
        const ENDPOINT: &str = "publish";
        let raw = read_response(
            ENDPOINT,
            self.agent.post(self.account_url("media_publish")).send_form([
                ("creation_id", container_id.as_str()),
                ("access_token", self.access_token.expose_secret()),
            ]),
        )?;
        Ok(parse_publish_response(ENDPOINT, &raw)?)
    }
}

fn parse_container_response(
    endpoint: &'static str,
    raw: &RawResponse,
) -> Result<ContainerId, ApiError> {
    let body: IdBody = decode_json(endpoint, raw)?;
    require_field(endpoint, "id", body.id, raw).map(ContainerId::new)
}

fn parse_status_response(
    endpoint: &'static str,
    raw: &RawResponse,
) -> Result<ContainerStatus, ApiError> {
    let body: StatusBody = decode_json(endpoint, raw)?;
    require_field(endpoint, "status_code", body.status_code, raw).map(ContainerStatus::new)
}

fn parse_publish_response(
    endpoint: &'static str,
    raw: &RawResponse,
) -> Result<PublicationId, ApiError> {
    let body: IdBody = decode_json(endpoint, raw)?;
    require_field(endpoint, "id", body.id, raw).map(PublicationId::new)
}
