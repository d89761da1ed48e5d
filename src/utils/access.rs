//! Ownership checks shared by modules that expose per-student data
//! (results, attendance, invoices, student records).

use anyhow::Context;
use campusly_core::AppError;
use campusly_models::users::UserRole;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

/// Profile id of the student account `user_id`, if it has one.
pub async fn student_id_for_user(db: &PgPool, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to look up student profile")
        .map_err(AppError::database)
}

/// Profile id of the parent account `user_id`, if it has one.
pub async fn parent_id_for_user(db: &PgPool, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM parents WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to look up parent profile")
        .map_err(AppError::database)
}

/// Allows staff, the student themselves, or a parent linked to the student.
///
/// Returns 404 when the student does not exist so callers cannot probe ids.
#[instrument(skip(db, auth_user))]
pub async fn ensure_student_access(
    db: &PgPool,
    auth_user: &AuthUser,
    student_id: Uuid,
) -> Result<(), AppError> {
    let (student_user_id,) =
        sqlx::query_as::<_, (Uuid,)>("SELECT user_id FROM students WHERE id = $1")
            .bind(student_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch student")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

    let caller = auth_user.user_id()?;
    let allowed = match auth_user.role()? {
        UserRole::Admin | UserRole::Teacher => true,
        UserRole::Student => student_user_id == caller,
        UserRole::Parent => is_linked_parent(db, caller, student_id).await?,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You do not have access to this student".to_string(),
        ))
    }
}

async fn is_linked_parent(
    db: &PgPool,
    parent_user_id: Uuid,
    student_id: Uuid,
) -> Result<bool, AppError> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM parent_students ps
            JOIN parents p ON p.id = ps.parent_id
            WHERE p.user_id = $1 AND ps.student_id = $2
        )",
    )
    .bind(parent_user_id)
    .bind(student_id)
    .fetch_one(db)
    .await
    .context("Failed to check parent link")
    .map_err(AppError::database)
}
