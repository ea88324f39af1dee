//! Error types for bonsaictl
//!
//! Library errors are folded into [`BonsaiCtlError`], which knows how to
//! print itself as a diagnostic with follow-up tips.

use bonsai_api::{ApiStatus, Error as ApiError};
use bonsai_config::ConfigError;
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic printed to stderr.
///
/// ```text
/// error: Authentication failed: get cluster https://api.bonsai.io/clusters/logs-1234: ...
///
///   tip: Check the profile's credentials: bonsaictl profile show
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, tip: impl Into<String>) -> Self {
        self.tips.push(tip.into());
        self
    }

    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

#[derive(Error, Debug)]
pub enum BonsaiCtlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Output formatting error: {message}")]
    Output { message: String },
}

pub type Result<T> = std::result::Result<T, BonsaiCtlError>;

impl BonsaiCtlError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            BonsaiCtlError::Config(ConfigError::UnknownProfile { name }) => vec![
                "List available profiles: bonsaictl profile list".to_string(),
                format!("Create it: bonsaictl profile set {name} --api-key <key>"),
            ],
            BonsaiCtlError::Config(ConfigError::NoProfiles) => vec![
                "Create a profile: bonsaictl profile set default --api-key <key> --default"
                    .to_string(),
                "Or export BONSAI_API_KEY and BONSAI_API_TOKEN".to_string(),
            ],
            BonsaiCtlError::AuthenticationFailed { .. } => vec![
                "Check the profile's credentials: bonsaictl profile show".to_string(),
                "Access keys are managed at https://app.bonsai.io".to_string(),
            ],
            BonsaiCtlError::NotFound { .. } => {
                vec!["List what this profile can see with the matching 'list' command".to_string()]
            }
            BonsaiCtlError::Connection { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the profile's api_url: bonsaictl profile show".to_string(),
            ],
            _ => vec![],
        }
    }

    pub fn print_diagnostic(&self) {
        self.suggestions()
            .into_iter()
            .fold(CliDiagnostic::error(self.to_string()), CliDiagnostic::tip)
            .print();
    }

    fn from_status(status: u16, message: String) -> Self {
        match ApiStatus::from_code(status) {
            Some(ApiStatus::Unauthorized) | Some(ApiStatus::Forbidden) => {
                BonsaiCtlError::AuthenticationFailed { message }
            }
            Some(ApiStatus::NotFound) => BonsaiCtlError::NotFound { message },
            Some(ApiStatus::TooManyRequests) => BonsaiCtlError::RateLimited { message },
            Some(ApiStatus::UnprocessableEntity) => BonsaiCtlError::InvalidInput { message },
            _ => BonsaiCtlError::Api { message },
        }
    }
}

impl From<ApiError> for BonsaiCtlError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        if err.is_cancelled() {
            return BonsaiCtlError::Cancelled { message };
        }
        if let Some(status) = err.status() {
            return BonsaiCtlError::from_status(status, message);
        }
        match err.root() {
            ApiError::Transport(_) => BonsaiCtlError::Connection { message },
            ApiError::InvalidInput(_)
            | ApiError::InvalidCredentials(_)
            | ApiError::InvalidUrl { .. } => BonsaiCtlError::InvalidInput { message },
            _ => BonsaiCtlError::Api { message },
        }
    }
}

impl From<anyhow::Error> for BonsaiCtlError {
    fn from(err: anyhow::Error) -> Self {
        BonsaiCtlError::Output {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BonsaiCtlError {
    fn from(err: std::io::Error) -> Self {
        BonsaiCtlError::Output {
            message: format!("IO error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonsai_api::CancelReason;

    #[test]
    fn test_status_mapping() {
        let classify = |status| BonsaiCtlError::from_status(status, String::new());
        assert!(matches!(classify(401), BonsaiCtlError::AuthenticationFailed { .. }));
        assert!(matches!(classify(403), BonsaiCtlError::AuthenticationFailed { .. }));
        assert!(matches!(classify(404), BonsaiCtlError::NotFound { .. }));
        assert!(matches!(classify(422), BonsaiCtlError::InvalidInput { .. }));
        assert!(matches!(classify(429), BonsaiCtlError::RateLimited { .. }));
        assert!(matches!(classify(500), BonsaiCtlError::Api { .. }));
    }

    #[test]
    fn test_cancellation_mapping() {
        let err = BonsaiCtlError::from(ApiError::Cancelled(CancelReason::Cancelled));
        assert!(matches!(err, BonsaiCtlError::Cancelled { .. }));
    }

    #[test]
    fn test_local_validation_mapping() {
        let err = BonsaiCtlError::from(ApiError::InvalidInput("name can't be empty".into()));
        assert!(matches!(err, BonsaiCtlError::InvalidInput { .. }));
        assert!(err.to_string().contains("name can't be empty"));
    }

    #[test]
    fn test_profile_not_found_suggests_profile_set() {
        let err = BonsaiCtlError::from(ConfigError::UnknownProfile {
            name: "prod".to_string(),
        });
        assert!(err.suggestions().iter().any(|s| s.contains("profile set prod")));
    }
}
