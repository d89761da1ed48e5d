//! # Campusly Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT signing secret and token lifetimes
//! - [`cors`]: Allowed CORS origins
//! - [`email`]: SMTP settings for outgoing mail
//! - [`rate_limit`]: Governor-based API rate limits
//! - [`otp`]: One-time code length, lifetime, attempts and resend cooldown
//! - [`invite`]: Invite token lifetime
//! - [`library`]: Library loan limits and overdue fines
//! - [`server`]: Listen address
//!
//! Every struct exposes `from_env()` and falls back to defaults when a
//! variable is unset or unparseable.
//!
//! # Example
//!
//! ```ignore
//! use campusly_config::{JwtConfig, OtpConfig};
//!
//! let jwt = JwtConfig::from_env();
//! let otp = OtpConfig::from_env();
//! ```

use std::str::FromStr;

pub mod cors;
pub mod email;
pub mod invite;
pub mod jwt;
pub mod library;
pub mod otp;
pub mod rate_limit;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use invite::InviteConfig;
pub use jwt::JwtConfig;
pub use library::LibraryConfig;
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Reads `key` and parses it, falling back to `default`.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a boolean flag; accepts `true`/`1` (case-insensitive) as enabled.
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}
