//! Storage service-account credentials, held in memory only.
//!
//! The key blob is parsed once at startup. Private key material and issued
//! access tokens live in `SecretString`s and are zeroized when dropped.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use ureq::Agent;

use crate::error::{ApiError, ConfigError, StoreError};
use crate::http::{decode_json, read_response, require_field};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const ASSERTION_LIFETIME_SECS: u64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct KeyFile {
    client_email: Option<String>,
    private_key: Option<String>,
    token_uri: Option<String>,
}

pub struct ServiceAccountKey {
    client_email: String,
    private_key: SecretString,
    token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(blob: &str) -> Result<Self, ConfigError> {
        let file: KeyFile = serde_json::from_str(blob)
            .map_err(|err| ConfigError::Credentials(format!("not a JSON key: {err}")))?;
        let client_email = file
            .client_email
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::Credentials("missing client_email".to_string()))?;
        let private_key = file
            .private_key
            .filter(|value| !value.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::Credentials("missing private_key".to_string()))?;
        EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
            .map_err(|err| ConfigError::Credentials(format!("private_key: {err}")))?;
        let token_uri = file
            .token_uri
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Ok(Self {
            client_email,
            private_key,
            token_uri,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Build the signed RS256 assertion for the JWT-bearer grant.
    pub fn assertion(&self, scope: &str, issued_at: u64) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Bearer token with its local expiry deadline.
pub struct AccessToken {
    secret: SecretString,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(secret: SecretString, lifetime: Duration) -> Self {
        let now = Instant::now();
        Self {
            secret,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    pub fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret.expose_secret())
    }
}

/// Exchange a signed assertion for a store access token.
pub fn fetch_access_token(
    agent: &Agent,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<AccessToken, StoreError> {
    const ENDPOINT: &str = "token exchange";
    let issued_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let assertion = key.assertion(scope, issued_at)?;
    tracing::debug!(client_email = key.client_email(), "requesting storage access token");
    let raw = read_response(
        ENDPOINT,
        agent
            .post(key.token_uri())
            .send_form([("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]),
    )
    .map_err(StoreError::Auth)?;
    parse_token_response(ENDPOINT, &raw).map_err(StoreError::Auth)
}

fn parse_token_response(
    endpoint: &'static str,
    raw: &crate::http::RawResponse,
) -> Result<AccessToken, ApiError> {
    let body: TokenBody = decode_json(endpoint, raw)?;
    let token = require_field(endpoint, "access_token", body.access_token, raw)?;
    // Tokens are never trusted past the assertion lifetime.
    let lifetime = Duration::from_secs(
        body.expires_in
            .unwrap_or(ASSERTION_LIFETIME_SECS)
            .min(ASSERTION_LIFETIME_SECS),
    );
    Ok(AccessToken::new(SecretString::from(token), lifetime))
}
