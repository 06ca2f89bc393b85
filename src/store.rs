//! Cloud file store client (Google Drive v3).
//!
//! Only two operations are needed: find the oldest pending video in a folder
//! and delete it once published. Both requests opt into shared drives.

use serde::Deserialize;
use std::cell::RefCell;
use ureq::Agent;

use crate::credentials::{fetch_access_token, AccessToken, ServiceAccountKey, DRIVE_SCOPE};
use crate::error::{ApiError, StoreError};
use crate::http::{decode_json, read_response, RawResponse};
use crate::util::payload_snippet;

pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";
const LIST_FIELDS: &str = "files(id,name,mimeType,createdTime,webContentLink)";

/// A pending video in the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub download_ref: String,
}

pub trait MediaStore {
    /// Oldest item in `folder_id` matching the configured content type.
    /// `Ok(None)` means the folder has nothing pending.
    fn find_oldest_media(&self, folder_id: &str) -> Result<Option<MediaItem>, StoreError>;

    fn delete_source(&self, item_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: Option<String>,
    name: Option<String>,
    created_time: Option<String>,
    web_content_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveStore {
    agent: Agent,
    key: ServiceAccountKey,
    mime_type: String,
    token: RefCell<Option<AccessToken>>,
}

impl DriveStore {
    pub fn new(agent: Agent, key: ServiceAccountKey, mime_type: &str) -> Self {
        Self {
            agent,
            key,
            mime_type: mime_type.to_string(),
            token: RefCell::new(None),
        }
    }

    /// Authorization header value, refreshing the cached token when stale.
    fn authorization(&self) -> Result<String, StoreError> {
        let mut cached = self.token.borrow_mut();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.bearer());
        }
        let token = fetch_access_token(&self.agent, &self.key, DRIVE_SCOPE)?;
        let bearer = token.bearer();
        *cached = Some(token);
        Ok(bearer)
    }
}

impl MediaStore for DriveStore {
    fn find_oldest_media(&self, folder_id: &str) -> Result<Option<MediaItem>, StoreError> {
        const ENDPOINT: &str = "list files";
        let authorization = self.authorization()?;
        let query = folder_query(folder_id, &self.mime_type);
        tracing::debug!(folder_id, query = query.as_str(), "listing source folder");
        let item = read_response(
            ENDPOINT,
            self.agent
                .get(DRIVE_FILES_URL)
                .header("Authorization", &authorization)
                .query("q", &query)
                .query("orderBy", "createdTime")
                .query("pageSize", "1")
                .query("fields", LIST_FIELDS)
                .query("supportsAllDrives", "true")
                .query("includeItemsFromAllDrives", "true")
                .call(),
        )
        .and_then(|raw| parse_listing(ENDPOINT, &raw))
        .map_err(|source| StoreError::List {
            folder_id: folder_id.to_string(),
            source,
        })?;
        Ok(item)
    }

    fn delete_source(&self, item_id: &str) -> Result<(), StoreError> {
        const ENDPOINT: &str = "delete file";
        let authorization = self.authorization()?;
        let raw = read_response(
            ENDPOINT,
            self.agent
                .delete(format!("{DRIVE_FILES_URL}/{item_id}"))
                .header("Authorization", &authorization)
                .query("supportsAllDrives", "true")
                .call(),
        )
        .and_then(|raw| expect_success(ENDPOINT, raw))
        .map_err(|source| StoreError::Delete {
            file_id: item_id.to_string(),
            source,
        })?;
        tracing::debug!(item_id, status = raw.status, "source deleted");
        Ok(())
    }
}

/// Drive search expression scoping the listing to one folder and content type.
pub fn folder_query(folder_id: &str, mime_type: &str) -> String {
    format!(
        "'{}' in parents and mimeType = '{}' and trashed = false",
        escape_query_literal(folder_id),
        escape_query_literal(mime_type)
    )
}

fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn direct_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

fn parse_listing(endpoint: &'static str, raw: &RawResponse) -> Result<Option<MediaItem>, ApiError> {
    let listing: FileList = decode_json(endpoint, raw)?;
    Ok(select_oldest(listing.files))
}

/// Earliest-created entry of a listing page. Entries without an id are skipped.
/// RFC 3339 timestamps from the same service compare correctly as strings.
fn select_oldest(files: Vec<DriveFile>) -> Option<MediaItem> {
    let returned = files.len();
    let oldest = files
        .into_iter()
        .filter_map(|file| {
            let id = file.id.filter(|id| !id.is_empty())?;
            let download_ref = file
                .web_content_link
                .filter(|link| !link.is_empty())
                .unwrap_or_else(|| direct_download_url(&id));
            let name = file.name.unwrap_or_else(|| id.clone());
            Some((
                file.created_time.unwrap_or_default(),
                MediaItem {
                    id,
                    name,
                    download_ref,
                },
            ))
        })
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, item)| item);
    if oldest.is_none() && returned > 0 {
        tracing::warn!(returned, "listing returned files but none had an id");
    }
    oldest
}

fn expect_success(endpoint: &'static str, raw: RawResponse) -> Result<RawResponse, ApiError> {
    if raw.is_success() {
        return Ok(raw);
    }
    Err(ApiError::Status {
        endpoint,
        status: raw.status,
        body: payload_snippet(&raw.body),
    })
}
