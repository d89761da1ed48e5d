use anyhow::Context;
use campusly_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use campusly_config::{JwtConfig, OtpConfig};
use campusly_core::{AppError, hash_password, verify_password};
use campusly_observability::{track_login_failure, track_login_success, track_user_created};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::invites::service::InviteService;
use crate::modules::otp::service::OtpService;
use crate::modules::users::model::{USER_COLUMNS, User, UserRole};
use crate::modules::users::service::{NewUser, UserService};
use crate::utils::email::EmailService;

use super::model::{
    ForgotPasswordRequest, InviteRegisterRequest, LoginRequest, LoginResponse, OtpPurpose,
    RefreshTokenRequest, RegisterRequest, RegisterResponse, ResendOtpRequest,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_CODE: &str = "Invalid or expired code";

pub struct AuthService;

impl AuthService {
    /// Self-registration for students and parents. The account starts
    /// unverified and a verification code is mailed.
    #[instrument(skip(db, otp_config, email, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn register(
        db: &PgPool,
        otp_config: &OtpConfig,
        email: &EmailService,
        dto: RegisterRequest,
    ) -> Result<RegisterResponse, AppError> {
        if !dto.role.is_self_registrable() {
            return Err(AppError::forbidden(format!(
                "Registering as {} requires an invite",
                dto.role
            )));
        }

        let password_hash = hash_password(&dto.password)?;
        let user = UserService::insert_user(
            db,
            NewUser {
                first_name: &dto.first_name,
                last_name: &dto.last_name,
                email: &dto.email,
                phone: dto.phone.as_deref(),
                password_hash: &password_hash,
                role: dto.role,
                is_verified: false,
            },
        )
        .await?;
        track_user_created(&user.role);

        let code = OtpService::issue(
            db,
            otp_config,
            user.id,
            OtpPurpose::EmailVerification,
            false,
        )
        .await?;
        email.send_otp(
            &user.email,
            &user.first_name,
            OtpPurpose::EmailVerification,
            &code,
            otp_config.ttl_seconds,
        );

        info!(user_id = %user.id, "User registered");
        Ok(RegisterResponse {
            user,
            message: "Registration successful. Check your email for a verification code."
                .to_string(),
        })
    }

    /// Registration through an invite. The invite supplies email and role and
    /// proves the address, so the account is created verified.
    #[instrument(skip(db, dto))]
    pub async fn register_with_invite(
        db: &PgPool,
        dto: InviteRegisterRequest,
    ) -> Result<RegisterResponse, AppError> {
        InviteService::expire_stale(db).await?;

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let invite = InviteService::redeem(&mut *tx, &dto.token).await?;
        let role: UserRole = invite.role.parse().map_err(AppError::internal_error)?;

        let user = UserService::insert_user(
            &mut *tx,
            NewUser {
                first_name: &dto.first_name,
                last_name: &dto.last_name,
                email: &invite.email,
                phone: dto.phone.as_deref(),
                password_hash: &password_hash,
                role,
                is_verified: true,
            },
        )
        .await?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_user_created(&user.role);
        info!(user_id = %user.id, invite_id = %invite.id, "User registered from invite");
        Ok(RegisterResponse {
            user,
            message: "Registration successful. You can now log in.".to_string(),
        })
    }

    #[instrument(skip(db, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let Some(credentials) = UserService::get_credentials_by_email(db, &dto.email).await? else {
            track_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&dto.password, &credentials.password_hash)? {
            track_login_failure("wrong_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !credentials.is_active {
            track_login_failure("inactive");
            return Err(AppError::forbidden("Account is deactivated".to_string()));
        }

        if !credentials.is_verified {
            track_login_failure("unverified");
            return Err(AppError::forbidden(
                "Email address is not verified".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_login_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(credentials.id)
        .fetch_one(db)
        .await
        .context("Failed to record login")
        .map_err(AppError::database)?;

        let access_token = create_access_token(user.id, &user.email, &user.role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, &user.email, jwt_config)?;

        track_login_success(&user.role);
        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            user,
        })
    }

    /// Exchanges a refresh token for a new pair. The role is re-read so a
    /// role change takes effect on the next refresh.
    #[instrument(skip(db, jwt_config, dto))]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: RefreshTokenRequest,
    ) -> Result<TokenResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))?;

        let user = UserService::get_user(db, user_id)
            .await
            .map_err(|_| AppError::unauthorized("User no longer exists".to_string()))?;

        if !user.is_active {
            return Err(AppError::unauthorized("Account is deactivated".to_string()));
        }

        Ok(TokenResponse {
            access_token: create_access_token(user.id, &user.email, &user.role, jwt_config)?,
            refresh_token: create_refresh_token(user.id, &user.email, jwt_config)?,
            token_type: "Bearer".to_string(),
        })
    }

    /// Verifies an email verification code and marks the user verified.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn verify_otp(db: &PgPool, dto: VerifyOtpRequest) -> Result<User, AppError> {
        if dto.purpose == OtpPurpose::PasswordReset {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Password reset codes are used with /api/auth/reset-password"
            )));
        }

        let user = UserService::get_user_by_email(db, &dto.email)
            .await?
            .ok_or_else(|| AppError::bad_request(anyhow::anyhow!(INVALID_CODE)))?;

        if user.is_verified {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Email is already verified"
            )));
        }

        OtpService::verify(db, user.id, dto.purpose, dto.code.trim()).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .fetch_one(db)
        .await
        .context("Failed to mark user verified")
        .map_err(AppError::database)?;

        info!(user_id = %user.id, "Email verified");
        Ok(user)
    }

    /// Reissues a code. Unknown emails and already verified accounts are
    /// answered the same way as a real resend.
    #[instrument(skip(db, otp_config, email, dto), fields(email = %dto.email))]
    pub async fn resend_otp(
        db: &PgPool,
        otp_config: &OtpConfig,
        email: &EmailService,
        dto: ResendOtpRequest,
    ) -> Result<(), AppError> {
        let Some(user) = UserService::get_user_by_email(db, &dto.email).await? else {
            return Ok(());
        };

        let eligible = match dto.purpose {
            OtpPurpose::EmailVerification => !user.is_verified,
            OtpPurpose::PasswordReset => user.is_active,
        };
        if !eligible {
            return Ok(());
        }

        let code = OtpService::issue(db, otp_config, user.id, dto.purpose, true).await?;
        email.send_otp(
            &user.email,
            &user.first_name,
            dto.purpose,
            &code,
            otp_config.ttl_seconds,
        );
        Ok(())
    }

    #[instrument(skip(db, otp_config, email, dto), fields(email = %dto.email))]
    pub async fn forgot_password(
        db: &PgPool,
        otp_config: &OtpConfig,
        email: &EmailService,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let request = ResendOtpRequest {
            email: dto.email,
            purpose: OtpPurpose::PasswordReset,
        };

        match Self::resend_otp(db, otp_config, email, request).await {
            Err(err) if err.status.as_u16() == 429 => {
                warn!("Password reset requested inside cooldown");
                Ok(())
            }
            other => other,
        }
    }

    #[instrument(skip(db, email, dto), fields(email = %dto.email))]
    pub async fn reset_password(
        db: &PgPool,
        email: &EmailService,
        dto: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        let user = UserService::get_user_by_email(db, &dto.email)
            .await?
            .ok_or_else(|| AppError::bad_request(anyhow::anyhow!(INVALID_CODE)))?;

        OtpService::verify(db, user.id, OtpPurpose::PasswordReset, dto.code.trim()).await?;
        let user = UserService::set_password(db, user.id, &dto.new_password).await?;

        email.send_password_changed(&user.email, &user.first_name);
        info!(user_id = %user.id, "Password reset");
        Ok(())
    }
}
