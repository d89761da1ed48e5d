//! Invite tokens for staff self-registration.
//!
//! Only the SHA-256 digest of a token is stored. Expiry is lazy: rows past
//! `expires_at` are flipped to `expired` whenever invites are read.

use anyhow::Context;
use campusly_auth::invite::{generate_token, hash_token};
use campusly_config::InviteConfig;
use campusly_core::{AppError, Paginated, PaginationMeta};
use campusly_observability::{track_invite_created, track_invite_redeemed};
use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    CreateInviteDto, INVITE_COLUMNS, Invite, InviteError, InviteFilterParams, InvitePreview,
    InviteStatus,
};

fn closed(err: InviteError) -> AppError {
    AppError::bad_request(anyhow::anyhow!("{}", err))
}

pub struct InviteService;

impl InviteService {
    /// Creates an invite and returns it with the plaintext token, which is
    /// not recoverable afterwards.
    #[instrument(skip(db, config, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn create_invite(
        db: &PgPool,
        config: &InviteConfig,
        created_by: Uuid,
        dto: CreateInviteDto,
    ) -> Result<(Invite, String), AppError> {
        let token = generate_token();
        let ttl_hours = dto.expires_in_hours.unwrap_or(config.default_ttl_hours);
        let expires_at = Utc::now() + Duration::hours(ttl_hours);

        let invite = sqlx::query_as::<_, Invite>(&format!(
            "INSERT INTO invites (email, role, token_hash, max_uses, expires_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            INVITE_COLUMNS
        ))
        .bind(dto.email.trim().to_lowercase())
        .bind(dto.role.as_str())
        .bind(hash_token(&token))
        .bind(dto.max_uses.unwrap_or(1))
        .bind(expires_at)
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Invite token collision, try again"))?;

        track_invite_created(&invite.role);
        info!(invite_id = %invite.id, "Invite created");
        Ok((invite, token))
    }

    /// Persists `expired` on every open invite past its expiry.
    pub async fn expire_stale(db: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE invites SET status = 'expired', updated_at = NOW()
             WHERE status IN ('pending', 'active') AND expires_at <= NOW()",
        )
        .execute(db)
        .await
        .context("Failed to expire invites")
        .map_err(AppError::database)?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(db))]
    pub async fn list_invites(
        db: &PgPool,
        filters: InviteFilterParams,
    ) -> Result<Paginated<Invite>, AppError> {
        Self::expire_stale(db).await?;

        let status = filters.status.map(|s| s.as_str());
        let pagination = filters.pagination();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invites WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(db)
        .await
        .context("Failed to count invites")
        .map_err(AppError::database)?;

        let invites = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {} FROM invites
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
            INVITE_COLUMNS
        ))
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch invites")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            invites,
            PaginationMeta::from_params(total, &pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_invite(db: &PgPool, id: Uuid) -> Result<Invite, AppError> {
        Self::expire_stale(db).await?;

        sqlx::query_as::<_, Invite>(&format!("SELECT {} FROM invites WHERE id = $1", INVITE_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch invite")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invite not found")))
    }

    #[instrument(skip(db))]
    pub async fn revoke_invite(db: &PgPool, id: Uuid) -> Result<Invite, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let invite = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {} FROM invites WHERE id = $1 FOR UPDATE",
            INVITE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch invite")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invite not found")))?;

        let state = invite.state()?;
        let now = Utc::now();
        if let Err(err) = state.revoke(now) {
            persist_status(&mut *tx, invite.id, state.effective_status(now), &invite.status).await?;
            tx.commit()
                .await
                .context("Failed to commit transaction")
                .map_err(AppError::database)?;
            return Err(closed(err));
        }

        let revoked = set_status(&mut *tx, invite.id, InviteStatus::Revoked, invite.use_count).await?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(invite_id = %id, "Invite revoked");
        Ok(revoked)
    }

    /// Public lookup by token. A pending invite becomes active once opened.
    #[instrument(skip(db, token))]
    pub async fn validate_token(db: &PgPool, token: &str) -> Result<InvitePreview, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let invite = lock_by_token(&mut *tx, token).await?;
        let state = invite.state()?;
        let now = Utc::now();

        let status = match state.open(now) {
            Ok(opened) => opened,
            Err(InviteError::Closed(status)) => status,
        };
        persist_status(&mut *tx, invite.id, status, &invite.status).await?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Ok(InvitePreview {
            email: invite.email,
            role: invite.role,
            status,
            expires_at: invite.expires_at,
            uses_left: (invite.max_uses - invite.use_count).max(0),
        })
    }

    /// Consumes one use of the invite inside the caller's transaction.
    ///
    /// The caller commits only after the user row is written, so a failed
    /// registration does not burn a use.
    #[instrument(skip(conn, token))]
    pub async fn redeem(conn: &mut PgConnection, token: &str) -> Result<Invite, AppError> {
        let invite = lock_by_token(conn, token).await?;
        let redemption = invite.state()?.redeem(Utc::now()).map_err(closed)?;

        let updated = set_status(conn, invite.id, redemption.status, redemption.use_count).await?;
        track_invite_redeemed(&updated.role);
        Ok(updated)
    }
}

async fn lock_by_token(conn: &mut PgConnection, token: &str) -> Result<Invite, AppError> {
    sqlx::query_as::<_, Invite>(&format!(
        "SELECT {} FROM invites WHERE token_hash = $1 FOR UPDATE",
        INVITE_COLUMNS
    ))
    .bind(hash_token(token))
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to fetch invite")
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invite not found")))
}

async fn set_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: InviteStatus,
    use_count: i32,
) -> Result<Invite, AppError> {
    sqlx::query_as::<_, Invite>(&format!(
        "UPDATE invites SET status = $1, use_count = $2, updated_at = NOW()
         WHERE id = $3
         RETURNING {}",
        INVITE_COLUMNS
    ))
    .bind(status.as_str())
    .bind(use_count)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to update invite")
    .map_err(AppError::database)
}

/// Writes `status` only when it differs from what is stored.
async fn persist_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: InviteStatus,
    stored: &str,
) -> Result<(), AppError> {
    if status.as_str() == stored {
        return Ok(());
    }
    sqlx::query("UPDATE invites SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to update invite status")
        .map_err(AppError::database)?;
    Ok(())
}
