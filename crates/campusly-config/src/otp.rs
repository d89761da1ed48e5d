use crate::env_or;

/// One-time code policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpConfig {
    /// Number of decimal digits in a code.
    pub length: usize,
    /// Lifetime of a code in seconds.
    pub ttl_seconds: i64,
    /// Wrong guesses allowed before the code is exhausted.
    pub max_attempts: i32,
    /// Minimum seconds between two issued codes for the same user and purpose.
    pub resend_cooldown_seconds: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            ttl_seconds: 600,
            max_attempts: 5,
            resend_cooldown_seconds: 60,
        }
    }
}

impl OtpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            length: env_or("OTP_LENGTH", defaults.length).clamp(4, 10),
            ttl_seconds: env_or("OTP_TTL_SECONDS", defaults.ttl_seconds),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            resend_cooldown_seconds: env_or(
                "OTP_RESEND_COOLDOWN_SECONDS",
                defaults.resend_cooldown_seconds,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OtpConfig::default();
        assert_eq!(config.length, 6);
        assert_eq!(config.ttl_seconds, 600);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.resend_cooldown_seconds, 60);
    }
}
