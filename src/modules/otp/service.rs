use anyhow::Context;
use campusly_auth::otp::{generate_code, hash_code, resend_wait_seconds};
use campusly_config::OtpConfig;
use campusly_core::AppError;
use campusly_observability::{track_otp_issued, track_otp_verification};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::model::{OtpCheck, OtpCode, OtpPurpose};

const OTP_COLUMNS: &str =
    "id, user_id, purpose, code_hash, expires_at, attempts, max_attempts, consumed_at, created_at";

pub struct OtpService;

impl OtpService {
    /// Issues a fresh code for `user_id` and returns it in plaintext so it can
    /// be mailed. Older unconsumed codes for the same purpose stop working.
    ///
    /// With `enforce_cooldown` a second request inside the resend window is
    /// rejected with 429.
    #[instrument(skip(db, config))]
    pub async fn issue(
        db: &PgPool,
        config: &OtpConfig,
        user_id: Uuid,
        purpose: OtpPurpose,
        enforce_cooldown: bool,
    ) -> Result<String, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let now = Utc::now();

        if enforce_cooldown {
            let last_issued_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
                "SELECT MAX(created_at) FROM otp_codes WHERE user_id = $1 AND purpose = $2",
            )
            .bind(user_id)
            .bind(purpose.as_str())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read last issued code")
            .map_err(AppError::database)?;

            if let Some(wait) =
                resend_wait_seconds(last_issued_at, config.resend_cooldown_seconds, now)
            {
                return Err(AppError::too_many_requests(format!(
                    "Please wait {} seconds before requesting a new code",
                    wait
                )));
            }
        }

        sqlx::query(
            "UPDATE otp_codes SET invalidated_at = NOW()
             WHERE user_id = $1 AND purpose = $2
               AND consumed_at IS NULL AND invalidated_at IS NULL",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await
        .context("Failed to invalidate previous codes")
        .map_err(AppError::database)?;

        let code = generate_code(config.length);
        let expires_at = now + Duration::seconds(config.ttl_seconds);

        sqlx::query(
            "INSERT INTO otp_codes (user_id, purpose, code_hash, expires_at, max_attempts)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .bind(hash_code(user_id, purpose, &code))
        .bind(expires_at)
        .bind(config.max_attempts)
        .execute(&mut *tx)
        .await
        .context("Failed to store code")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_otp_issued(purpose.as_str());
        info!(%user_id, purpose = %purpose, "One-time code issued");
        Ok(code)
    }

    /// Checks `code` against the latest live code. Only a match consumes it;
    /// a wrong guess uses up one attempt.
    #[instrument(skip(db, code))]
    pub async fn verify(
        db: &PgPool,
        user_id: Uuid,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<(), AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let latest = sqlx::query_as::<_, OtpCode>(&format!(
            "SELECT {} FROM otp_codes
             WHERE user_id = $1 AND purpose = $2 AND invalidated_at IS NULL
             ORDER BY created_at DESC
             LIMIT 1
             FOR UPDATE",
            OTP_COLUMNS
        ))
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch code")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("No active code, request a new one")))?;

        let outcome = latest
            .state()
            .check(&hash_code(user_id, purpose, code), Utc::now());

        match outcome {
            OtpCheck::Verified => {
                sqlx::query("UPDATE otp_codes SET consumed_at = NOW() WHERE id = $1")
                    .bind(latest.id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to consume code")
                    .map_err(AppError::database)?;
            }
            OtpCheck::Mismatch { .. } => {
                sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1")
                    .bind(latest.id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to record attempt")
                    .map_err(AppError::database)?;
            }
            OtpCheck::Expired | OtpCheck::Exhausted | OtpCheck::AlreadyConsumed => {}
        }

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_otp_verification(purpose.as_str(), outcome_label(outcome));

        match outcome {
            OtpCheck::Verified => Ok(()),
            OtpCheck::Exhausted => {
                warn!(%user_id, purpose = %purpose, "Code exhausted");
                Err(AppError::too_many_requests(outcome.message()))
            }
            _ => Err(AppError::bad_request(anyhow::anyhow!(outcome.message()))),
        }
    }
}

fn outcome_label(outcome: OtpCheck) -> &'static str {
    match outcome {
        OtpCheck::Verified => "verified",
        OtpCheck::Expired => "expired",
        OtpCheck::Mismatch { .. } => "mismatch",
        OtpCheck::Exhausted => "exhausted",
        OtpCheck::AlreadyConsumed => "consumed",
    }
}
