use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta, hash_password};
use campusly_observability::track_user_created;
use campusly_models::classes::has_room;
use campusly_models::users::like_pattern;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::{NewUser, UserService};

use super::model::{CreateStudentDto, STUDENT_SELECT, Student, StudentFilterParams, UpdateStudentDto};

/// Profile fields written alongside a new student account.
#[derive(Debug, Clone)]
pub struct NewStudentProfile<'a> {
    pub user_id: Uuid,
    pub admission_number: &'a str,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub gender: Option<&'a str>,
    pub address: Option<&'a str>,
    pub class_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

pub struct StudentService;

impl StudentService {
    /// Checks that `section_id` belongs to `class_id` and still has a free
    /// seat. The section row is locked until the caller's transaction ends.
    pub async fn check_enrollment(
        conn: &mut PgConnection,
        class_id: Option<Uuid>,
        section_id: Option<Uuid>,
        student_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(class_id) = class_id else {
            if section_id.is_some() {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "section_id requires class_id"
                )));
            }
            return Ok(());
        };

        let class_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM classes WHERE id = $1)")
                .bind(class_id)
                .fetch_one(&mut *conn)
                .await
                .context("Failed to check class")
                .map_err(AppError::database)?;
        if !class_exists {
            return Err(AppError::bad_request(anyhow::anyhow!("Class not found")));
        }

        let Some(section_id) = section_id else {
            return Ok(());
        };

        let (section_class, capacity) = sqlx::query_as::<_, (Uuid, Option<i32>)>(
            "SELECT class_id, capacity FROM sections WHERE id = $1 FOR UPDATE",
        )
        .bind(section_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch section")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Section not found")))?;

        if section_class != class_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Section does not belong to the class"
            )));
        }

        let enrolled = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students
             WHERE section_id = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(section_id)
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to count section students")
        .map_err(AppError::database)?;

        if !has_room(capacity, enrolled) {
            return Err(AppError::conflict(anyhow::anyhow!("Section is full")));
        }

        Ok(())
    }

    /// Inserts a student profile and returns its id.
    pub async fn insert_profile(
        conn: &mut PgConnection,
        profile: NewStudentProfile<'_>,
    ) -> Result<Uuid, AppError> {
        Self::check_enrollment(&mut *conn, profile.class_id, profile.section_id, None).await?;

        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO students
                (user_id, admission_number, date_of_birth, gender, address, class_id, section_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(profile.user_id)
        .bind(profile.admission_number.trim())
        .bind(profile.date_of_birth)
        .bind(profile.gender)
        .bind(profile.address)
        .bind(profile.class_id)
        .bind(profile.section_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                &format!(
                    "Admission number {} is already in use",
                    profile.admission_number
                ),
            )
        })
    }

    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
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
                role: UserRole::Student,
                is_verified: true,
            },
        )
        .await?;

        let student_id = Self::insert_profile(
            &mut tx,
            NewStudentProfile {
                user_id: user.id,
                admission_number: &dto.admission_number,
                date_of_birth: dto.date_of_birth,
                gender: dto.gender.as_deref(),
                address: dto.address.as_deref(),
                class_id: dto.class_id,
                section_id: dto.section_id,
            },
        )
        .await?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_user_created(UserRole::Student.as_str());
        info!(%student_id, "Student created");
        Self::get_student(db, student_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<Paginated<Student>, AppError> {
        let search = like_pattern(filters.search.as_deref());

        const WHERE: &str = "WHERE ($1::uuid IS NULL OR s.class_id = $1)
              AND ($2::uuid IS NULL OR s.section_id = $2)
              AND ($3::text IS NULL OR u.first_name ILIKE $3 OR u.last_name ILIKE $3
                   OR u.email ILIKE $3 OR s.admission_number ILIKE $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM students s JOIN users u ON u.id = s.user_id {}",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.section_id)
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count students")
        .map_err(AppError::database)?;

        let students = sqlx::query_as::<_, Student>(&format!(
            "{} {} ORDER BY u.last_name, u.first_name LIMIT $4 OFFSET $5",
            STUDENT_SELECT, WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.section_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch students")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            students,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!("{} WHERE s.id = $1", STUDENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch student")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_student(db, id).await?;

        let class_changed = dto.class_id.is_some() && dto.class_id != existing.class_id;
        let class_id = dto.class_id.or(existing.class_id);
        let section_id = match dto.section_id {
            Some(section_id) => Some(section_id),
            None if class_changed => None,
            None => existing.section_id,
        };
        let admission_number = dto
            .admission_number
            .unwrap_or_else(|| existing.admission_number.clone());

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        if class_id != existing.class_id || section_id != existing.section_id {
            Self::check_enrollment(&mut tx, class_id, section_id, Some(id)).await?;
        }

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
        .context("Failed to update student account")
        .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE students
             SET admission_number = $1, date_of_birth = $2, gender = $3, address = $4,
                 class_id = $5, section_id = $6, updated_at = NOW()
             WHERE id = $7",
        )
        .bind(&admission_number)
        .bind(dto.date_of_birth.or(existing.date_of_birth))
        .bind(dto.gender.or(existing.gender))
        .bind(dto.address.or(existing.address))
        .bind(class_id)
        .bind(section_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                &format!("Admission number {} is already in use", admission_number),
            )
        })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Self::get_student(db, id).await
    }

    /// Removes the student's account; the profile and its records cascade.
    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let student = Self::get_student(db, id).await?;
        UserService::delete_user_with_role(db, student.user_id, UserRole::Student, "Student not found")
            .await
    }
}
