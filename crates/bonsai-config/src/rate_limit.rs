//! Per-profile rate limit overrides
//!
//! Unset fields fall back to the API's documented limits.

use std::time::Duration;

use bonsai_api::{
    ClientBuilder, DEFAULT_BURST_ALLOWANCE, DEFAULT_BURST_INTERVAL, PROVISION_BURST_ALLOWANCE,
    PROVISION_BURST_INTERVAL,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per default window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_burst: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_interval_secs: Option<u64>,

    /// Provisioning requests allowed per provisioning window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_burst: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_interval_secs: Option<u64>,
}

impl RateLimitConfig {
    pub fn default_limit(&self) -> (u32, Duration) {
        (
            self.default_burst.unwrap_or(DEFAULT_BURST_ALLOWANCE),
            self.default_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_BURST_INTERVAL),
        )
    }

    pub fn provision_limit(&self) -> (u32, Duration) {
        (
            self.provision_burst.unwrap_or(PROVISION_BURST_ALLOWANCE),
            self.provision_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(PROVISION_BURST_INTERVAL),
        )
    }

    /// Install both limits on a client builder.
    pub fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        let (burst, interval) = self.default_limit();
        let (provision_burst, provision_interval) = self.provision_limit();
        builder
            .default_rate_limit(burst, interval)
            .provision_rate_limit(provision_burst, provision_interval)
    }
}
