use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    Class, ClassDetail, ClassFilterParams, CreateClassDto, CreateSectionDto, Section,
    SectionWithCount, UpdateClassDto, UpdateSectionDto,
};

const SECTION_WITH_COUNT_SELECT: &str = "SELECT sec.id, sec.class_id, sec.name, sec.capacity,
        sec.created_at, sec.updated_at,
        (SELECT COUNT(*) FROM students s WHERE s.section_id = sec.id) AS student_count
     FROM sections sec";

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_class(db: &PgPool, dto: CreateClassDto) -> Result<Class, AppError> {
        if let Some(teacher_id) = dto.class_teacher_id {
            UserService::ensure_role(db, teacher_id, UserRole::Teacher, "Class teacher").await?;
        }

        let class = sqlx::query_as::<_, Class>(
            "INSERT INTO classes (name, academic_year, class_teacher_id)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(dto.name.trim())
        .bind(dto.academic_year.trim())
        .bind(dto.class_teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            AppError::from_write(e, "A class with this name already exists for the academic year")
        })?;

        info!(class_id = %class.id, "Class created");
        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn list_classes(
        db: &PgPool,
        filters: ClassFilterParams,
    ) -> Result<Paginated<Class>, AppError> {
        const WHERE: &str = "WHERE ($1::text IS NULL OR academic_year = $1)";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM classes {}", WHERE))
                .bind(&filters.academic_year)
                .fetch_one(db)
                .await
                .context("Failed to count classes")
                .map_err(AppError::database)?;

        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT * FROM classes {} ORDER BY academic_year DESC, name LIMIT $2 OFFSET $3",
            WHERE
        ))
        .bind(&filters.academic_year)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch classes")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            classes,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    pub async fn get_class(db: &PgPool, id: Uuid) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch class")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_class_detail(db: &PgPool, id: Uuid) -> Result<ClassDetail, AppError> {
        let class = Self::get_class(db, id).await?;
        let sections = Self::list_sections(db, id).await?;

        let student_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE class_id = $1")
                .bind(id)
                .fetch_one(db)
                .await
                .context("Failed to count class students")
                .map_err(AppError::database)?;

        Ok(ClassDetail {
            class,
            sections,
            student_count,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_class(
        db: &PgPool,
        id: Uuid,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let existing = Self::get_class(db, id).await?;

        if let Some(teacher_id) = dto.class_teacher_id {
            UserService::ensure_role(db, teacher_id, UserRole::Teacher, "Class teacher").await?;
        }

        sqlx::query_as::<_, Class>(
            "UPDATE classes
             SET name = $1, academic_year = $2, class_teacher_id = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING *",
        )
        .bind(dto.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(
            dto.academic_year
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.academic_year),
        )
        .bind(dto.class_teacher_id.or(existing.class_teacher_id))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            AppError::from_write(e, "A class with this name already exists for the academic year")
        })
    }

    #[instrument(skip(db))]
    pub async fn delete_class(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        Self::get_class(db, id).await?;

        let enrolled = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM students WHERE class_id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to check class enrollment")
        .map_err(AppError::database)?;

        if enrolled {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete a class with enrolled students"
            )));
        }

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete class")
            .map_err(AppError::database)?;

        info!(class_id = %id, "Class deleted");
        Ok(())
    }

    #[instrument(skip(db, dto))]
    pub async fn create_section(
        db: &PgPool,
        class_id: Uuid,
        dto: CreateSectionDto,
    ) -> Result<Section, AppError> {
        Self::get_class(db, class_id).await?;

        sqlx::query_as::<_, Section>(
            "INSERT INTO sections (class_id, name, capacity) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(class_id)
        .bind(dto.name.trim())
        .bind(dto.capacity)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Section name already exists in this class"))
    }

    #[instrument(skip(db))]
    pub async fn list_sections(
        db: &PgPool,
        class_id: Uuid,
    ) -> Result<Vec<SectionWithCount>, AppError> {
        sqlx::query_as::<_, SectionWithCount>(&format!(
            "{} WHERE sec.class_id = $1 ORDER BY sec.name",
            SECTION_WITH_COUNT_SELECT
        ))
        .bind(class_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch sections")
        .map_err(AppError::database)
    }

    async fn get_section(db: &PgPool, id: Uuid) -> Result<Section, AppError> {
        sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch section")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Section not found")))
    }

    /// Lowering capacity below the current headcount is rejected.
    #[instrument(skip(db, dto))]
    pub async fn update_section(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSectionDto,
    ) -> Result<Section, AppError> {
        let existing = Self::get_section(db, id).await?;

        if let Some(capacity) = dto.capacity {
            let enrolled =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE section_id = $1")
                    .bind(id)
                    .fetch_one(db)
                    .await
                    .context("Failed to count section students")
                    .map_err(AppError::database)?;
            if enrolled > i64::from(capacity) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Capacity cannot be below the {} students already assigned",
                    enrolled
                )));
            }
        }

        sqlx::query_as::<_, Section>(
            "UPDATE sections SET name = $1, capacity = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING *",
        )
        .bind(dto.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(dto.capacity.or(existing.capacity))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Section name already exists in this class"))
    }

    #[instrument(skip(db))]
    pub async fn delete_section(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        Self::get_section(db, id).await?;

        let assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM students WHERE section_id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to check section enrollment")
        .map_err(AppError::database)?;

        if assigned {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete a section with assigned students"
            )));
        }

        sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete section")
            .map_err(AppError::database)?;
        Ok(())
    }
}
