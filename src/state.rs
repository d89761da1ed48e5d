use campusly_config::{
    CorsConfig, EmailConfig, InviteConfig, JwtConfig, LibraryConfig, OtpConfig, RateLimitConfig,
};
use campusly_db::PgPool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub otp_config: OtpConfig,
    pub invite_config: InviteConfig,
    pub library_config: LibraryConfig,
}

impl AppState {
    /// Builds the state around an existing pool, reading everything else from
    /// the environment.
    pub fn from_env(db: PgPool) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            email_config: EmailConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            otp_config: OtpConfig::from_env(),
            invite_config: InviteConfig::from_env(),
            library_config: LibraryConfig::from_env(),
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = campusly_db::init_db_pool().await?;
    campusly_db::run_migrations(&db).await?;
    Ok(AppState::from_env(db))
}
