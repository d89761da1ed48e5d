//! Rate limiting configuration for API endpoints.
//!
//! Limits are token buckets keyed by client IP (taken from `X-Forwarded-For`,
//! `X-Real-IP` or the peer address, in that order):
//!
//! - `RATE_LIMIT_ENABLED`: Set to `false` to disable limiting (default: true)
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Replenish interval for general endpoints (default: 2)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Burst size for general endpoints (default: 30)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Replenish interval for auth endpoints (default: 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size for auth endpoints (default: 5)
//!
//! Auth endpoints (login, registration, OTP, password reset) get the stricter
//! limiter since they are the brute-force targets.

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::{env_flag, env_or};

pub type IpGovernorConfig =
    GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general_per_second: u64,
    pub general_burst_size: u32,
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or(
                "RATE_LIMIT_GENERAL_PER_SECOND",
                defaults.general_per_second,
            ),
            general_burst_size: env_or(
                "RATE_LIMIT_GENERAL_BURST_SIZE",
                defaults.general_burst_size,
            ),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// Configuration with limiting switched off, for tests and local tooling.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the governor config for general API endpoints.
    ///
    /// Returns `None` when the configured values are rejected by governor
    /// (a zero period or burst).
    #[must_use]
    pub fn general_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.general_per_second, self.general_burst_size)
    }

    /// Builds the governor config for authentication endpoints.
    #[must_use]
    pub fn auth_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.auth_per_second, self.auth_burst_size)
    }
}

fn build(per_second: u64, burst_size: u32) -> Option<IpGovernorConfig> {
    GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.general_per_second, 2);
        assert_eq!(config.general_burst_size, 30);
        assert_eq!(config.auth_per_second, 10);
        assert_eq!(config.auth_burst_size, 5);
    }

    #[test]
    fn test_disabled_keeps_limits() {
        let config = RateLimitConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.auth_burst_size, 5);
    }

    #[test]
    fn test_governor_configs_build() {
        let config = RateLimitConfig::default();
        assert!(config.general_governor_config().is_some());
        assert!(config.auth_governor_config().is_some());
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let config = RateLimitConfig {
            auth_burst_size: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.auth_governor_config().is_none());
    }
}
