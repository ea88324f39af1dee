//! API credentials.
//!
//! The Bonsai API authenticates with HTTP Basic auth: the access key is the
//! username and the access token is the password. Both halves are checked
//! once, at construction, to be usable verbatim as HTTP header values.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use thiserror::Error;

/// Rejected credential material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("invalid access key: not a valid HTTP header value")]
    InvalidAccessKey,

    #[error("invalid access token: not a valid HTTP header value")]
    InvalidAccessToken,

    #[error("credentials cannot be encoded as an Authorization header")]
    Unencodable,
}

fn is_header_safe(raw: &str) -> bool {
    HeaderValue::from_str(raw).is_ok()
}

/// The public half of a credential pair.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = raw.into();
        if !is_header_safe(&raw) {
            return Err(CredentialError::InvalidAccessKey);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessKey").field(&self.0).finish()
    }
}

impl FromStr for AccessKey {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The secret half of a credential pair. Never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = raw.into();
        if !is_header_safe(&raw) {
            return Err(CredentialError::InvalidAccessToken);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("AccessToken(\"\")")
        } else {
            f.write_str("AccessToken(***)")
        }
    }
}

impl FromStr for AccessToken {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An access key and token used together for Basic authorization.
///
/// The default value is the "unauthenticated" pair: requests built with it
/// carry no `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    key: AccessKey,
    token: AccessToken,
}

impl CredentialPair {
    pub fn new(key: AccessKey, token: AccessToken) -> Self {
        Self { key, token }
    }

    /// Validate and pair raw strings in one step.
    pub fn from_raw(key: &str, token: &str) -> Result<Self, CredentialError> {
        Ok(Self::new(AccessKey::new(key)?, AccessToken::new(token)?))
    }

    pub fn access_key(&self) -> &AccessKey {
        &self.key
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.token
    }

    /// True only when both halves are unset.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.token.is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// The `Authorization` header for this pair, or `None` when unauthenticated.
    pub(crate) fn authorization_header(&self) -> Result<Option<HeaderValue>, CredentialError> {
        if self.is_empty() {
            return Ok(None);
        }

        let encoded = STANDARD.encode(format!("{}:{}", self.key.0, self.token.0));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| CredentialError::Unencodable)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}
