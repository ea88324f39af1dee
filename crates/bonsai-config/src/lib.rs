//! Profile configuration for Bonsai API tools
//!
//! A TOML file holds named profiles, each carrying an access key, an access
//! token, the API endpoint and optional rate limit overrides.
//!
//! ```toml
//! default_profile = "production"
//!
//! [profiles.production]
//! api_key = "${BONSAI_PROD_KEY}"
//! api_token = "keyring:production-token"
//! api_url = "${BONSAI_API_URL:-https://api.bonsai.io}"
//!
//! [profiles.production.rate_limit]
//! provision_burst = 2
//! ```
//!
//! - `${VAR}` and `${VAR:-default}` are expanded when the file is loaded
//! - `keyring:<name>` values are read from the OS keyring (feature
//!   `secure-storage`)
//! - `BONSAI_API_KEY`, `BONSAI_API_TOKEN` and `BONSAI_API_URL` override the
//!   stored values when resolution is asked to honour the environment

pub mod config;
pub mod credential;
pub mod error;
pub mod rate_limit;

pub use config::{
    Config, ENV_API_KEY, ENV_API_TOKEN, ENV_API_URL, Profile, ResolvedCredentials,
};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
pub use rate_limit::RateLimitConfig;
