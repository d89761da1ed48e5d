use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteConfig {
    /// Lifetime applied when the creator does not specify one.
    pub default_ttl_hours: i64,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            default_ttl_hours: 72,
        }
    }
}

impl InviteConfig {
    pub fn from_env() -> Self {
        Self {
            default_ttl_hours: env_or("INVITE_TTL_HOURS", 72),
        }
    }
}
