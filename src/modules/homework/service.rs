use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use campusly_models::users::UserRole;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::subjects::service::SubjectService;

use super::model::{
    CreateHomeworkDto, GradeSubmissionDto, Homework, HomeworkFilterParams, Submission,
    SubmissionStatus, SubmitHomeworkDto, UpdateHomeworkDto,
};

/// Student profile id and current class of a student account.
#[derive(sqlx::FromRow)]
struct Enrollment {
    id: Uuid,
    class_id: Option<Uuid>,
}

async fn enrollment_for_user(db: &PgPool, user_id: Uuid) -> Result<Enrollment, AppError> {
    sqlx::query_as::<_, Enrollment>("SELECT id, class_id FROM students WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student enrollment")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student profile not found")))
}

pub struct HomeworkService;

impl HomeworkService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_homework(
        db: &PgPool,
        created_by: Uuid,
        dto: CreateHomeworkDto,
    ) -> Result<Homework, AppError> {
        let subject = SubjectService::get_subject(db, dto.subject_id).await?;
        if subject.class_id != dto.class_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Subject does not belong to this class"
            )));
        }

        let homework = sqlx::query_as::<_, Homework>(
            "INSERT INTO homework (class_id, subject_id, title, description, due_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(dto.class_id)
        .bind(dto.subject_id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.due_date)
        .bind(created_by)
        .fetch_one(db)
        .await
        .context("Failed to create homework")
        .map_err(AppError::database)?;

        info!(homework_id = %homework.id, "Homework assigned");
        Ok(homework)
    }

    /// Students are pinned to their own class regardless of the filter.
    #[instrument(skip(db, auth_user))]
    pub async fn list_homework(
        db: &PgPool,
        auth_user: &AuthUser,
        mut filters: HomeworkFilterParams,
    ) -> Result<Paginated<Homework>, AppError> {
        if auth_user.role()? == UserRole::Student {
            let enrollment = enrollment_for_user(db, auth_user.user_id()?).await?;
            match enrollment.class_id {
                Some(class_id) => filters.class_id = Some(class_id),
                None => {
                    return Ok(Paginated::new(
                        Vec::new(),
                        PaginationMeta::from_params(0, &filters.pagination),
                    ));
                }
            }
        }

        const WHERE: &str = "WHERE ($1::uuid IS NULL OR class_id = $1)
              AND ($2::uuid IS NULL OR subject_id = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM homework {}", WHERE))
            .bind(filters.class_id)
            .bind(filters.subject_id)
            .fetch_one(db)
            .await
            .context("Failed to count homework")
            .map_err(AppError::database)?;

        let homework = sqlx::query_as::<_, Homework>(&format!(
            "SELECT * FROM homework {} ORDER BY due_date DESC, created_at DESC LIMIT $3 OFFSET $4",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.subject_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch homework")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            homework,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    async fn fetch_homework(db: &PgPool, id: Uuid) -> Result<Homework, AppError> {
        sqlx::query_as::<_, Homework>("SELECT * FROM homework WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch homework")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Homework not found")))
    }

    #[instrument(skip(db, auth_user))]
    pub async fn get_homework(
        db: &PgPool,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<Homework, AppError> {
        let homework = Self::fetch_homework(db, id).await?;

        if auth_user.role()? == UserRole::Student {
            let enrollment = enrollment_for_user(db, auth_user.user_id()?).await?;
            if enrollment.class_id != Some(homework.class_id) {
                return Err(AppError::not_found(anyhow::anyhow!("Homework not found")));
            }
        }
        Ok(homework)
    }

    fn ensure_owner(auth_user: &AuthUser, homework: &Homework) -> Result<(), AppError> {
        if auth_user.is_admin() || homework.created_by == Some(auth_user.user_id()?) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the author or an admin can modify this homework".to_string(),
            ))
        }
    }

    #[instrument(skip(db, auth_user, dto))]
    pub async fn update_homework(
        db: &PgPool,
        auth_user: &AuthUser,
        id: Uuid,
        dto: UpdateHomeworkDto,
    ) -> Result<Homework, AppError> {
        let existing = Self::fetch_homework(db, id).await?;
        Self::ensure_owner(auth_user, &existing)?;

        sqlx::query_as::<_, Homework>(
            "UPDATE homework SET title = $1, description = $2, due_date = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING *",
        )
        .bind(dto.title.as_deref().map(str::trim).unwrap_or(&existing.title))
        .bind(dto.description.or(existing.description))
        .bind(dto.due_date.unwrap_or(existing.due_date))
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update homework")
        .map_err(AppError::database)
    }

    #[instrument(skip(db, auth_user))]
    pub async fn delete_homework(
        db: &PgPool,
        auth_user: &AuthUser,
        id: Uuid,
    ) -> Result<(), AppError> {
        let existing = Self::fetch_homework(db, id).await?;
        Self::ensure_owner(auth_user, &existing)?;

        sqlx::query("DELETE FROM homework WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete homework")
            .map_err(AppError::database)?;

        info!(homework_id = %id, "Homework deleted");
        Ok(())
    }

    /// One submission per student; replacing it is allowed until graded.
    #[instrument(skip(db, dto))]
    pub async fn submit(
        db: &PgPool,
        student_user_id: Uuid,
        homework_id: Uuid,
        dto: SubmitHomeworkDto,
    ) -> Result<Submission, AppError> {
        let homework = Self::fetch_homework(db, homework_id).await?;
        let enrollment = enrollment_for_user(db, student_user_id).await?;

        if enrollment.class_id != Some(homework.class_id) {
            return Err(AppError::forbidden(
                "Homework is not assigned to your class".to_string(),
            ));
        }

        let status = SubmissionStatus::on_submit(homework.due_date, Utc::now().date_naive());

        sqlx::query_as::<_, Submission>(
            "INSERT INTO homework_submissions (homework_id, student_id, content, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (homework_id, student_id) DO UPDATE
             SET content = EXCLUDED.content, status = EXCLUDED.status, submitted_at = NOW()
             WHERE homework_submissions.status <> $5
             RETURNING *",
        )
        .bind(homework_id)
        .bind(enrollment.id)
        .bind(&dto.content)
        .bind(status.as_str())
        .bind(SubmissionStatus::Graded.as_str())
        .fetch_optional(db)
        .await
        .context("Failed to save submission")
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!(
                "Submission has already been graded and cannot be replaced"
            ))
        })
    }

    #[instrument(skip(db))]
    pub async fn list_submissions(
        db: &PgPool,
        homework_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        Self::fetch_homework(db, homework_id).await?;

        sqlx::query_as::<_, Submission>(
            "SELECT * FROM homework_submissions WHERE homework_id = $1 ORDER BY submitted_at",
        )
        .bind(homework_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch submissions")
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto))]
    pub async fn grade(
        db: &PgPool,
        graded_by: Uuid,
        submission_id: Uuid,
        dto: GradeSubmissionDto,
    ) -> Result<Submission, AppError> {
        sqlx::query_as::<_, Submission>(
            "UPDATE homework_submissions
             SET grade = $1, feedback = $2, status = $3, graded_at = NOW(), graded_by = $4
             WHERE id = $5
             RETURNING *",
        )
        .bind(dto.grade.trim())
        .bind(&dto.feedback)
        .bind(SubmissionStatus::Graded.as_str())
        .bind(graded_by)
        .bind(submission_id)
        .fetch_optional(db)
        .await
        .context("Failed to grade submission")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Submission not found")))
    }
}
