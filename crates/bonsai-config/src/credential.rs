//! Credential resolution with environment overrides and optional keyring storage
//!
//! Stored profile values are either plaintext or a `keyring:<entry>`
//! reference. With the `secure-storage` feature the reference is looked up
//! in the OS keyring under the `bonsaictl` service.

use std::env;

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Prefix marking a value stored in the OS keyring
pub const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "bonsaictl";

/// Resolves and stores profile credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    keyring: bool,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Store backed by the OS keyring when the feature is enabled and a
    /// keyring service answers, plaintext otherwise.
    pub fn new() -> Self {
        Self {
            keyring: keyring_available(),
        }
    }

    /// Store that never touches the keyring.
    pub fn plaintext() -> Self {
        Self { keyring: false }
    }

    pub fn backend(&self) -> &'static str {
        if self.keyring { "keyring" } else { "plaintext" }
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Resolve a stored value.
    ///
    /// Resolution order:
    /// 1. `env_var`, when given and set
    /// 2. the keyring, for `keyring:` references
    /// 3. the value itself
    pub fn resolve(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            debug!("Using {} from the environment", var);
            return Ok(env_value);
        }

        match value.strip_prefix(KEYRING_PREFIX) {
            Some(entry) => read_keyring(entry),
            None => Ok(value.to_string()),
        }
    }

    /// Save `value` in the keyring under `entry`, returning the reference to
    /// write into the config file.
    pub fn store(&self, entry: &str, value: &str) -> Result<String> {
        if !self.keyring {
            return Err(ConfigError::Credential(
                "OS keyring is not available; store the value in plaintext instead".to_string(),
            ));
        }
        write_keyring(entry, value)?;
        Ok(format!("{KEYRING_PREFIX}{entry}"))
    }

    /// Remove the keyring entry behind a reference. Plaintext values are left alone.
    pub fn forget(&self, value: &str) -> Result<()> {
        match value.strip_prefix(KEYRING_PREFIX) {
            Some(entry) if self.keyring => delete_keyring(entry),
            _ => Ok(()),
        }
    }
}

#[cfg(feature = "secure-storage")]
fn keyring_available() -> bool {
    keyring::Entry::new(SERVICE_NAME, "__probe__").is_ok()
}

#[cfg(not(feature = "secure-storage"))]
fn keyring_available() -> bool {
    false
}

#[cfg(feature = "secure-storage")]
fn read_keyring(entry: &str) -> Result<String> {
    keyring::Entry::new(SERVICE_NAME, entry)
        .and_then(|e| e.get_password())
        .map_err(|e| {
            ConfigError::Keyring(format!("failed to read '{entry}' from keyring: {e}"))
        })
}

#[cfg(not(feature = "secure-storage"))]
fn read_keyring(entry: &str) -> Result<String> {
    Err(missing_feature(entry))
}

#[cfg(not(feature = "secure-storage"))]
fn missing_feature(entry: &str) -> ConfigError {
    ConfigError::Credential(format!(
        "'{KEYRING_PREFIX}{entry}' needs the secure-storage feature"
    ))
}

#[cfg(feature = "secure-storage")]
fn write_keyring(entry: &str, value: &str) -> Result<()> {
    keyring::Entry::new(SERVICE_NAME, entry)
        .and_then(|e| e.set_password(value))
        .map_err(|e| ConfigError::Keyring(format!("failed to store '{entry}': {e}")))
}

#[cfg(not(feature = "secure-storage"))]
fn write_keyring(entry: &str, _value: &str) -> Result<()> {
    Err(missing_feature(entry))
}

#[cfg(feature = "secure-storage")]
fn delete_keyring(entry: &str) -> Result<()> {
    let handle = keyring::Entry::new(SERVICE_NAME, entry)
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    match handle.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(ConfigError::Keyring(format!(
            "failed to delete '{entry}': {e}"
        ))),
    }
}

#[cfg(not(feature = "secure-storage"))]
fn delete_keyring(_entry: &str) -> Result<()> {
    Ok(())
}
