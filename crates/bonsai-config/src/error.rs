//! Errors raised while reading, writing or resolving bonsaictl profiles

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed bonsaictl config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode bonsaictl config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("no profile named '{name}'")]
    UnknownProfile { name: String },

    #[error(
        "no Bonsai profiles saved yet; \
         add one with 'bonsaictl profile set <name> --api-key <key>'"
    )]
    NoProfiles,

    #[error("profile '{name}' is unusable: {message}")]
    InvalidProfile { name: String, message: String },

    #[error("credential unavailable: {0}")]
    Credential(String),

    #[cfg(feature = "secure-storage")]
    #[error("OS keyring: {0}")]
    Keyring(String),

    #[error("no home directory to place bonsaictl/config.toml in")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
