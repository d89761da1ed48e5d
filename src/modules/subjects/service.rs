use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::service::ClassService;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};

const DUPLICATE_CODE: &str = "A subject with this code already exists";

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db, dto), fields(code = %dto.code))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        ClassService::get_class(db, dto.class_id).await?;
        if let Some(teacher_id) = dto.teacher_id {
            UserService::ensure_role(db, teacher_id, UserRole::Teacher, "Subject teacher").await?;
        }

        let subject = sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (name, code, class_id, teacher_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(dto.name.trim())
        .bind(dto.code.trim().to_uppercase())
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_CODE))?;

        info!(subject_id = %subject.id, "Subject created");
        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn list_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<Paginated<Subject>, AppError> {
        const WHERE: &str = "WHERE ($1::uuid IS NULL OR class_id = $1)
              AND ($2::uuid IS NULL OR teacher_id = $2)";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM subjects {}", WHERE))
                .bind(filters.class_id)
                .bind(filters.teacher_id)
                .fetch_one(db)
                .await
                .context("Failed to count subjects")
                .map_err(AppError::database)?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "SELECT * FROM subjects {} ORDER BY name LIMIT $3 OFFSET $4",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.teacher_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch subjects")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            subjects,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_subject(db: &PgPool, id: Uuid) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch subject")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_subject(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let existing = Self::get_subject(db, id).await?;

        if let Some(class_id) = dto.class_id {
            ClassService::get_class(db, class_id).await?;
        }
        if let Some(teacher_id) = dto.teacher_id {
            UserService::ensure_role(db, teacher_id, UserRole::Teacher, "Subject teacher").await?;
        }

        sqlx::query_as::<_, Subject>(
            "UPDATE subjects
             SET name = $1, code = $2, class_id = $3, teacher_id = $4, updated_at = NOW()
             WHERE id = $5
             RETURNING *",
        )
        .bind(dto.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(
            dto.code
                .map(|c| c.trim().to_uppercase())
                .unwrap_or(existing.code),
        )
        .bind(dto.class_id.unwrap_or(existing.class_id))
        .bind(dto.teacher_id.or(existing.teacher_id))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_CODE))
    }

    #[instrument(skip(db))]
    pub async fn delete_subject(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete subject")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }
        Ok(())
    }
}
