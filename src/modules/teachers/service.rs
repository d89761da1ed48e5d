use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta, hash_password};
use campusly_observability::track_user_created;
use campusly_models::users::like_pattern;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::{NewUser, UserService};

use super::model::{CreateTeacherDto, TEACHER_SELECT, Teacher, TeacherFilterParams, UpdateTeacherDto};

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_teacher(db: &PgPool, dto: CreateTeacherDto) -> Result<Teacher, AppError> {
        let password_hash = hash_password(&dto.password)?;

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let user = UserService::insert_user(
            &mut *tx,
            NewUser {
                first_name: &dto.first_name,
                last_name: &dto.last_name,
                email: &dto.email,
                phone: dto.phone.as_deref(),
                password_hash: &password_hash,
                role: UserRole::Teacher,
                is_verified: true,
            },
        )
        .await?;

        let teacher_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO teachers (user_id, employee_number, qualification, specialization, hire_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(user.id)
        .bind(dto.employee_number.trim())
        .bind(&dto.qualification)
        .bind(&dto.specialization)
        .bind(dto.hire_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                &format!("Employee number {} is already in use", dto.employee_number),
            )
        })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_user_created(UserRole::Teacher.as_str());
        info!(%teacher_id, "Teacher created");
        Self::get_teacher(db, teacher_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_teachers(
        db: &PgPool,
        filters: TeacherFilterParams,
    ) -> Result<Paginated<Teacher>, AppError> {
        let search = like_pattern(filters.search.as_deref());

        const WHERE: &str = "WHERE ($1::text IS NULL OR u.first_name ILIKE $1
              OR u.last_name ILIKE $1 OR u.email ILIKE $1 OR t.employee_number ILIKE $1
              OR t.specialization ILIKE $1)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM teachers t JOIN users u ON u.id = t.user_id {}",
            WHERE
        ))
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count teachers")
        .map_err(AppError::database)?;

        let teachers = sqlx::query_as::<_, Teacher>(&format!(
            "{} {} ORDER BY u.last_name, u.first_name LIMIT $2 OFFSET $3",
            TEACHER_SELECT, WHERE
        ))
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch teachers")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            teachers,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(db: &PgPool, id: Uuid) -> Result<Teacher, AppError> {
        sqlx::query_as::<_, Teacher>(&format!("{} WHERE t.id = $1", TEACHER_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch teacher")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_teacher(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTeacherDto,
    ) -> Result<Teacher, AppError> {
        let existing = Self::get_teacher(db, id).await?;
        let employee_number = dto
            .employee_number
            .unwrap_or_else(|| existing.employee_number.clone());

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, phone = $3, updated_at = NOW()
             WHERE id = $4",
        )
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(dto.phone.or(existing.phone))
        .bind(existing.user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update teacher account")
        .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE teachers
             SET employee_number = $1, qualification = $2, specialization = $3, hire_date = $4,
                 updated_at = NOW()
             WHERE id = $5",
        )
        .bind(&employee_number)
        .bind(dto.qualification.or(existing.qualification))
        .bind(dto.specialization.or(existing.specialization))
        .bind(dto.hire_date.or(existing.hire_date))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                &format!("Employee number {} is already in use", employee_number),
            )
        })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Self::get_teacher(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_teacher(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let teacher = Self::get_teacher(db, id).await?;
        UserService::delete_user_with_role(db, teacher.user_id, UserRole::Teacher, "Teacher not found")
            .await
    }
}
