use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use campusly_models::users::UserRole;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

use super::model::{
    Announcement, AnnouncementFilterParams, Audience, CreateAnnouncementDto,
    UpdateAnnouncementDto,
};

fn not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Announcement not found"))
}

pub struct AnnouncementService;

impl AnnouncementService {
    #[instrument(skip(db, dto), fields(audience = dto.audience.as_str()))]
    pub async fn create(
        db: &PgPool,
        author_id: Uuid,
        dto: CreateAnnouncementDto,
    ) -> Result<Announcement, AppError> {
        let announcement = sqlx::query_as::<_, Announcement>(
            "INSERT INTO announcements (title, body, audience, author_id, publish_at, expires_at)
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6)
             RETURNING *",
        )
        .bind(dto.title.trim())
        .bind(&dto.body)
        .bind(dto.audience.as_str())
        .bind(author_id)
        .bind(dto.publish_at)
        .bind(dto.expires_at)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_check_violation() {
                    return AppError::unprocessable(anyhow::anyhow!(
                        "expires_at must be after publish_at"
                    ));
                }
            }
            AppError::from_write(e, "Announcement already exists")
        })?;

        info!(announcement_id = %announcement.id, "Announcement posted");
        Ok(announcement)
    }

    /// Admins see every announcement; everyone else sees live ones aimed at
    /// `all` or their own role.
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        role: UserRole,
        filters: AnnouncementFilterParams,
    ) -> Result<Paginated<Announcement>, AppError> {
        const WHERE: &str = "WHERE $1::text IS NULL OR (
                audience IN ('all', $1)
                AND publish_at <= NOW()
                AND (expires_at IS NULL OR expires_at > NOW()))";
        let audience = (role != UserRole::Admin).then(|| Audience::for_role(role).as_str());

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM announcements {}", WHERE))
                .bind(audience)
                .fetch_one(db)
                .await
                .context("Failed to count announcements")
                .map_err(AppError::database)?;

        let announcements = sqlx::query_as::<_, Announcement>(&format!(
            "SELECT * FROM announcements {} ORDER BY publish_at DESC LIMIT $2 OFFSET $3",
            WHERE
        ))
        .bind(audience)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch announcements")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            announcements,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    async fn fetch(db: &PgPool, id: Uuid) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch announcement")
            .map_err(AppError::database)?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, role: UserRole, id: Uuid) -> Result<Announcement, AppError> {
        let announcement = Self::fetch(db, id).await?;
        if announcement.visible_to(role, Utc::now()) {
            Ok(announcement)
        } else {
            Err(not_found())
        }
    }

    fn ensure_author(auth_user: &AuthUser, announcement: &Announcement) -> Result<(), AppError> {
        if auth_user.is_admin() || announcement.author_id == Some(auth_user.user_id()?) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the author or an admin can modify this announcement".to_string(),
            ))
        }
    }

    #[instrument(skip(db, auth_user, dto))]
    pub async fn update(
        db: &PgPool,
        auth_user: &AuthUser,
        id: Uuid,
        dto: UpdateAnnouncementDto,
    ) -> Result<Announcement, AppError> {
        let existing = Self::fetch(db, id).await?;
        Self::ensure_author(auth_user, &existing)?;

        let publish_at = dto.publish_at.unwrap_or(existing.publish_at);
        let expires_at = dto.expires_at.or(existing.expires_at);
        if expires_at.is_some_and(|exp| exp <= publish_at) {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "expires_at must be after publish_at"
            )));
        }

        sqlx::query_as::<_, Announcement>(
            "UPDATE announcements
             SET title = $1, body = $2, audience = $3, publish_at = $4, expires_at = $5,
                 updated_at = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(dto.title.as_deref().map(str::trim).unwrap_or(&existing.title))
        .bind(dto.body.unwrap_or(existing.body))
        .bind(
            dto.audience
                .map(|a| a.as_str().to_string())
                .unwrap_or(existing.audience),
        )
        .bind(publish_at)
        .bind(expires_at)
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update announcement")
        .map_err(AppError::database)
    }

    #[instrument(skip(db, auth_user))]
    pub async fn delete(db: &PgPool, auth_user: &AuthUser, id: Uuid) -> Result<(), AppError> {
        let existing = Self::fetch(db, id).await?;
        Self::ensure_author(auth_user, &existing)?;

        sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete announcement")
            .map_err(AppError::database)?;

        info!(announcement_id = %id, "Announcement deleted");
        Ok(())
    }
}
