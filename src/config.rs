//! Run configuration, loaded once from the process environment.
//!
//! The four required names are checked together so a misconfigured
//! deployment learns about every missing value in one run. After loading,
//! `Settings` is immutable and passed by reference.

use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cli::RunOverrides;
use crate::credentials::ServiceAccountKey;
use crate::error::ConfigError;
use crate::poller::PollPolicy;
use crate::publisher::DEFAULT_GRAPH_VERSION;
use crate::store::DEFAULT_MIME_TYPE;

pub const CREDENTIALS_VAR: &str = "GDRIVE_CREDENTIALS_JSON";
pub const FOLDER_VAR: &str = "GDRIVE_FOLDER_ID";
pub const ACCESS_TOKEN_VAR: &str = "IG_ACCESS_TOKEN";
pub const ACCOUNT_VAR: &str = "IG_USER_ID";

pub const CAPTION_VAR: &str = "REEL_CAPTION";
pub const MIME_TYPE_VAR: &str = "REEL_MIME_TYPE";
pub const POLL_ATTEMPTS_VAR: &str = "REEL_POLL_ATTEMPTS";
pub const POLL_INTERVAL_VAR: &str = "REEL_POLL_INTERVAL_SECS";
pub const GRAPH_VERSION_VAR: &str = "GRAPH_API_VERSION";

/// Required names in reporting order.
pub const REQUIRED_VARS: [&str; 4] = [CREDENTIALS_VAR, FOLDER_VAR, ACCESS_TOKEN_VAR, ACCOUNT_VAR];

pub const DEFAULT_CAPTION: &str = "Your daily reel! #reels #viral";

#[derive(Debug)]
pub struct StorageSettings {
    pub credentials: ServiceAccountKey,
    pub folder_id: String,
    pub mime_type: String,
}

#[derive(Debug)]
pub struct PublishingSettings {
    pub access_token: SecretString,
    pub account_id: String,
    pub api_version: String,
}

#[derive(Debug)]
pub struct Settings {
    pub storage: StorageSettings,
    pub publishing: PublishingSettings,
    pub caption_template: String,
    pub poll: PollPolicy,
}

impl Settings {
    pub fn from_env(overrides: &RunOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), overrides)
    }

    /// Build settings from any name lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F, overrides: &RunOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let missing: Vec<&'static str> = REQUIRED_VARS
            .into_iter()
            .filter(|name| value(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        let required =
            |name: &'static str| value(name).ok_or_else(|| ConfigError::Missing(vec![name]));

        let credentials = ServiceAccountKey::from_json(&required(CREDENTIALS_VAR)?)?;

        let max_attempts = match overrides.max_attempts {
            Some(attempts) => attempts,
            None => parse_number(POLL_ATTEMPTS_VAR, value(POLL_ATTEMPTS_VAR))?
                .unwrap_or(PollPolicy::default().max_attempts),
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: POLL_ATTEMPTS_VAR,
                reason: "must be at least 1".to_string(),
            });
        }
        let interval = match overrides.interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => parse_number(POLL_INTERVAL_VAR, value(POLL_INTERVAL_VAR))?
                .map(Duration::from_secs)
                .unwrap_or(PollPolicy::default().interval),
        };

        Ok(Self {
            storage: StorageSettings {
                credentials,
                folder_id: required(FOLDER_VAR)?,
                mime_type: overrides
                    .mime_type
                    .clone()
                    .or_else(|| value(MIME_TYPE_VAR))
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            },
            publishing: PublishingSettings {
                access_token: SecretString::from(required(ACCESS_TOKEN_VAR)?),
                account_id: required(ACCOUNT_VAR)?,
                api_version: value(GRAPH_VERSION_VAR)
                    .unwrap_or_else(|| DEFAULT_GRAPH_VERSION.to_string()),
            },
            caption_template: overrides
                .caption
                .clone()
                .or_else(|| value(CAPTION_VAR))
                .unwrap_or_else(|| DEFAULT_CAPTION.to_string()),
            poll: PollPolicy {
                max_attempts,
                interval,
            },
        })
    }
}

fn parse_number<T>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.map(|raw| {
        raw.parse::<T>().map_err(|err| ConfigError::Invalid {
            name,
            reason: format!("{raw:?}: {err}"),
        })
    })
    .transpose()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
