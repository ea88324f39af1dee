//! Builds authenticated API clients from profiles and the environment

use std::path::PathBuf;

use bonsai_api::{Application, BASE_ENDPOINT, Cancellation, Client, CredentialPair};
use bonsai_config::{
    Config, ConfigError, ENV_API_KEY, ENV_API_TOKEN, ENV_API_URL, RateLimitConfig,
    ResolvedCredentials,
};
use tracing::{debug, info, trace, warn};

use crate::error::{BonsaiCtlError, Result as CliResult};

#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    cancel: Cancellation,
}

/// Endpoint, credentials and limits for one client
#[derive(Debug)]
struct ClientSettings {
    credentials: Option<ResolvedCredentials>,
    api_url: String,
    rate_limit: RateLimitConfig,
}

impl ConnectionManager {
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            cancel: Cancellation::new(),
        }
    }

    /// Every client created afterwards observes `cancel`.
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        match self.config_path {
            Some(ref path) => config.save_to_path(path)?,
            None => config.save()?,
        }
        Ok(())
    }

    /// Path of the file profile changes are written to
    pub fn config_file(&self) -> CliResult<PathBuf> {
        match self.config_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Create a client for `profile_name` (or the default profile).
    ///
    /// When --config-file is given, environment variables are ignored so the
    /// file is the only source of credentials.
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<Client> {
        let use_env = self.config_path.is_none();
        if !use_env {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let settings = self.resolve_settings(profile_name, use_env)?;
        info!("Connecting to Bonsai API: {}", settings.api_url);

        let mut builder = Client::builder()
            .endpoint(&settings.api_url)
            .application(Application::new("bonsaictl", env!("CARGO_PKG_VERSION")))
            .cancellation(self.cancel.clone());
        builder = settings.rate_limit.apply(builder);

        match settings.credentials {
            Some(creds) => {
                trace!(
                    "API key: {}...",
                    creds.api_key.chars().take(4).collect::<String>()
                );
                let pair = CredentialPair::from_raw(&creds.api_key, &creds.api_token)
                    .map_err(|e| BonsaiCtlError::invalid_input(e.to_string()))?;
                builder = builder.credentials(pair);
            }
            None => warn!("No credentials configured; requests will be unauthenticated"),
        }

        let client = builder.build()?;
        debug!("Bonsai client created for {}", client.endpoint());
        Ok(client)
    }

    fn resolve_settings(
        &self,
        profile_name: Option<&str>,
        use_env: bool,
    ) -> CliResult<ClientSettings> {
        let env_var = |name: &str| {
            use_env
                .then(|| std::env::var(name).ok())
                .flatten()
                .filter(|v| !v.is_empty())
        };
        let env_key = env_var(ENV_API_KEY);
        let env_token = env_var(ENV_API_TOKEN);
        let env_url = env_var(ENV_API_URL);

        // A complete key and token in the environment skip the config file
        if let (Some(api_key), Some(api_token)) = (&env_key, &env_token) {
            info!("Using Bonsai credentials from environment variables");
            let api_url = env_url.unwrap_or_else(|| BASE_ENDPOINT.to_string());
            return Ok(ClientSettings {
                credentials: Some(ResolvedCredentials {
                    api_key: api_key.clone(),
                    api_token: api_token.clone(),
                    api_url: api_url.clone(),
                }),
                api_url,
                rate_limit: RateLimitConfig::default(),
            });
        }

        match self.config.resolve_profile(profile_name) {
            Ok(name) => {
                info!("Using profile: {}", name);
                let profile = self.config.profile(&name)?;
                let credentials = profile.resolve_credentials(use_env)?;
                Ok(ClientSettings {
                    api_url: credentials.api_url.clone(),
                    credentials: Some(credentials),
                    rate_limit: profile.rate_limit(),
                })
            }
            Err(ConfigError::NoProfiles) => Ok(ClientSettings {
                credentials: None,
                api_url: env_url.unwrap_or_else(|| BASE_ENDPOINT.to_string()),
                rate_limit: RateLimitConfig::default(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonsai_config::Profile;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var(ENV_API_KEY);
            std::env::remove_var(ENV_API_TOKEN);
            std::env::remove_var(ENV_API_URL);
        }
    }

    fn manager_with(config: Config) -> ConnectionManager {
        ConnectionManager::with_config_path(
            config,
            Some(PathBuf::from("/nonexistent/config.toml")),
        )
    }

    #[test]
    fn test_profile_settings() {
        let mut config = Config::default();
        config.set_profile(
            "ci",
            Profile::new("ci-key", "ci-token").with_api_url("http://localhost:9200"),
        );

        let settings = manager_with(config).resolve_settings(None, false).unwrap();
        let credentials = settings.credentials.unwrap();
        assert_eq!(credentials.api_key, "ci-key");
        assert_eq!(settings.api_url, "http://localhost:9200");
    }

    #[test]
    fn test_no_profiles_is_unauthenticated() {
        let settings = manager_with(Config::default())
            .resolve_settings(None, false)
            .unwrap();
        assert!(settings.credentials.is_none());
        assert_eq!(settings.api_url, BASE_ENDPOINT);
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let err = manager_with(Config::default())
            .resolve_settings(Some("prod"), false)
            .unwrap_err();
        assert!(matches!(
            err,
            BonsaiCtlError::Config(ConfigError::UnknownProfile { .. })
        ));
    }

    #[tokio::test]
    async fn test_client_uses_profile_endpoint_and_user_agent() {
        let mut config = Config::default();
        config.set_profile(
            "ci",
            Profile::new("ci-key", "ci-token").with_api_url("http://localhost:9200/"),
        );

        let client = manager_with(config).create_client(Some("ci")).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9200");
        assert!(client.user_agent().starts_with("bonsaictl/"));
        assert_eq!(client.credentials().access_key().as_str(), "ci-key");
    }

    #[test]
    #[serial]
    fn test_complete_env_credentials_win_over_profile() {
        clear_env();
        unsafe {
            std::env::set_var(ENV_API_KEY, "env-key");
            std::env::set_var(ENV_API_TOKEN, "env-token");
        }

        let mut config = Config::default();
        config.set_profile("ci", Profile::new("ci-key", "ci-token"));
        let settings = manager_with(config).resolve_settings(Some("ci"), true).unwrap();
        clear_env();

        let credentials = settings.credentials.unwrap();
        assert_eq!(credentials.api_key, "env-key");
        assert_eq!(credentials.api_token, "env-token");
        assert_eq!(settings.api_url, BASE_ENDPOINT);
    }

    #[test]
    #[serial]
    fn test_partial_env_overrides_profile_field() {
        clear_env();
        unsafe {
            std::env::set_var(ENV_API_URL, "http://localhost:9999");
        }

        let mut config = Config::default();
        config.set_profile("ci", Profile::new("ci-key", "ci-token"));
        let settings = manager_with(config).resolve_settings(None, true).unwrap();
        clear_env();

        let credentials = settings.credentials.unwrap();
        assert_eq!(credentials.api_key, "ci-key");
        assert_eq!(settings.api_url, "http://localhost:9999");
    }

    #[test]
    #[serial]
    fn test_env_ignored_with_explicit_config_file() {
        clear_env();
        unsafe {
            std::env::set_var(ENV_API_KEY, "env-key");
            std::env::set_var(ENV_API_TOKEN, "env-token");
        }

        let mut config = Config::default();
        config.set_profile("ci", Profile::new("ci-key", "ci-token"));
        let settings = manager_with(config).resolve_settings(None, false).unwrap();
        clear_env();

        assert_eq!(settings.credentials.unwrap().api_key, "ci-key");
    }
}
