//! Profile file model and loading

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use bonsai_api::BASE_ENDPOINT;

use crate::credential::CredentialStore;
use crate::error::{ConfigError, Result};
use crate::rate_limit::RateLimitConfig;

/// Overrides the profile's access key
pub const ENV_API_KEY: &str = "BONSAI_API_KEY";
/// Overrides the profile's access token
pub const ENV_API_TOKEN: &str = "BONSAI_API_TOKEN";
/// Overrides the profile's API endpoint
pub const ENV_API_URL: &str = "BONSAI_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// A named set of API credentials
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub api_key: String,
    pub api_token: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("api_key", &self.api_key)
            .field("api_token", &redact(&self.api_token))
            .field("api_url", &self.api_url)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

/// Credentials after keyring lookup and environment overrides
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub api_key: String,
    pub api_token: String,
    pub api_url: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_key", &self.api_key)
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn redact(value: &str) -> &str {
    if CredentialStore::is_keyring_reference(value) {
        value
    } else {
        "<redacted>"
    }
}

impl Profile {
    pub fn new(api_key: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_token: api_token.into(),
            api_url: default_api_url(),
            rate_limit: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Resolve keyring references and, when `use_env` is set, let
    /// `BONSAI_API_KEY`, `BONSAI_API_TOKEN` and `BONSAI_API_URL` override
    /// individual fields.
    pub fn resolve_credentials(&self, use_env: bool) -> Result<ResolvedCredentials> {
        let store = CredentialStore::new();
        let env = |var: &'static str| use_env.then_some(var);

        let api_key = store
            .resolve(&self.api_key, env(ENV_API_KEY))
            .map_err(|e| ConfigError::Credential(format!("api_key: {e}")))?;
        let api_token = store
            .resolve(&self.api_token, env(ENV_API_TOKEN))
            .map_err(|e| ConfigError::Credential(format!("api_token: {e}")))?;
        let api_url = store
            .resolve(&self.api_url, env(ENV_API_URL))
            .map_err(|e| ConfigError::Credential(format!("api_url: {e}")))?;

        Ok(ResolvedCredentials {
            api_key,
            api_token,
            api_url,
        })
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        self.rate_limit.clone().unwrap_or_default()
    }

    /// Masked access key for display
    pub fn api_key_preview(&self) -> String {
        if CredentialStore::is_keyring_reference(&self.api_key) {
            return self.api_key.clone();
        }
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}...")
    }
}

impl Config {
    /// Resolve the profile name to use.
    ///
    /// Resolution order:
    /// 1. `explicit` (must exist)
    /// 2. `default_profile`
    /// 3. the first profile by name
    pub fn resolve_profile(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit {
            if !self.profiles.contains_key(name) {
                return Err(ConfigError::UnknownProfile {
                    name: name.to_string(),
                });
            }
            return Ok(name.to_string());
        }

        if let Some(ref name) = self.default_profile {
            return Ok(name.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or(ConfigError::NoProfiles)
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path. A missing file is an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config file at {}", config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Read {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let expanded = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded)?;
        config.validate()?;

        trace!(
            "Loaded {} profiles from {}",
            config.profiles.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::Write {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    pub fn set_default_profile(&mut self, name: &str) -> Result<()> {
        self.profile(name)?;
        self.default_profile = Some(name.to_string());
        Ok(())
    }

    /// Remove a profile, clearing the default if it pointed at it
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.default_profile
            && !self.profiles.contains_key(name)
        {
            return Err(ConfigError::InvalidProfile {
                name: name.clone(),
                message: "default_profile names a profile that does not exist".to_string(),
            });
        }
        for (name, profile) in &self.profiles {
            if profile.api_key.trim().is_empty() {
                return Err(ConfigError::InvalidProfile {
                    name: name.clone(),
                    message: "api_key is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/bonsaictl/config.toml
    /// On macOS: ~/.config/bonsaictl/config.toml when that directory exists,
    /// otherwise ~/Library/Application Support/io.bonsai.bonsaictl/config.toml
    /// On Windows: %APPDATA%\bonsai\bonsaictl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style = base_dirs.home_dir().join(".config").join("bonsaictl");
                if linux_style.exists() {
                    return Ok(linux_style.join("config.toml"));
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("io", "bonsai", "bonsaictl").ok_or(ConfigError::NoConfigDir)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references.
    ///
    /// Unset variables without a default are left in place so profiles that
    /// are never used don't need their variables defined.
    pub(crate) fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .into_owned()
    }
}

fn default_api_url() -> String {
    BASE_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn config_with(names: &[&str]) -> Config {
        let mut config = Config::default();
        for name in names {
            config.set_profile(*name, Profile::new(format!("{name}-key"), "token"));
        }
        config
    }

    #[test]
    fn test_config_serialization() {
        let mut config = config_with(&["staging"]);
        config.set_profile(
            "production",
            Profile::new("prod-key", "keyring:production-token")
                .with_api_url("https://api.example.test")
                .with_rate_limit(RateLimitConfig {
                    provision_burst: Some(2),
                    ..Default::default()
                }),
        );
        config.set_default_profile("production").unwrap();

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_api_url_defaults_to_production_endpoint() {
        let config: Config = toml::from_str(
            r#"
[profiles.dev]
api_key = "key"
api_token = "token"
"#,
        )
        .unwrap();

        assert_eq!(config.profiles["dev"].api_url, "https://api.bonsai.io");
        assert!(config.profiles["dev"].rate_limit.is_none());
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = config_with(&["zeta", "alpha"]);

        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");
        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");

        config.set_default_profile("zeta").unwrap();
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn test_resolve_unknown_profile() {
        let config = config_with(&["alpha"]);
        let err = config.resolve_profile(Some("missing")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { name } if name == "missing"));
    }

    #[test]
    fn test_resolve_without_profiles() {
        let err = Config::default().resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles));
    }

    #[test]
    fn test_set_default_requires_existing_profile() {
        let mut config = config_with(&["alpha"]);
        assert!(config.set_default_profile("beta").is_err());
        assert_eq!(config.default_profile, None);
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = config_with(&["alpha", "beta"]);
        config.set_default_profile("alpha").unwrap();

        assert!(config.remove_profile("alpha").is_some());
        assert_eq!(config.default_profile, None);
        assert!(config.remove_profile("alpha").is_none());
        assert_eq!(config.resolve_profile(None).unwrap(), "beta");
    }

    #[test]
    fn test_profile_debug_redacts_token() {
        let debug = format!("{:?}", Profile::new("key", "super-secret"));
        assert!(!debug.contains("super-secret"));

        let debug = format!("{:?}", Profile::new("key", "keyring:prod"));
        assert!(debug.contains("keyring:prod"));
    }

    #[test]
    fn test_api_key_preview() {
        assert_eq!(Profile::new("abcdefgh", "t").api_key_preview(), "abcd...");
        assert_eq!(Profile::new("ab", "t").api_key_preview(), "ab...");
    }

    #[test]
    #[serial]
    fn test_resolve_credentials_ignores_env_when_asked() {
        unsafe {
            std::env::set_var(ENV_API_TOKEN, "env-token");
        }

        let profile = Profile::new("key", "stored-token");
        let isolated = profile.resolve_credentials(false).unwrap();
        let overridden = profile.resolve_credentials(true).unwrap();

        unsafe {
            std::env::remove_var(ENV_API_TOKEN);
        }

        assert_eq!(isolated.api_token, "stored-token");
        assert_eq!(overridden.api_token, "env-token");
        assert_eq!(overridden.api_key, "key");
        assert_eq!(overridden.api_url, "https://api.bonsai.io");
    }

    #[test]
    #[serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("BONSAI_TEST_KEY", "expanded-key");
        }

        let expanded = Config::expand_env_vars(r#"api_key = "${BONSAI_TEST_KEY}""#);
        assert_eq!(expanded, r#"api_key = "expanded-key""#);

        unsafe {
            std::env::remove_var("BONSAI_TEST_KEY");
        }
    }

    #[test]
    #[serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::remove_var("BONSAI_TEST_MISSING");
        }

        let expanded = Config::expand_env_vars(
            r#"api_url = "${BONSAI_TEST_MISSING:-https://staging.example.test}""#,
        );
        assert_eq!(expanded, r#"api_url = "https://staging.example.test""#);

        let untouched = Config::expand_env_vars(r#"api_key = "${BONSAI_TEST_MISSING}""#);
        assert!(untouched.contains("BONSAI_TEST_MISSING"));
    }
}
