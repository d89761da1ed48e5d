use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta, hash_password};
use campusly_observability::track_user_created;
use campusly_models::users::like_pattern;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::{NewUser, UserService};
use crate::utils::access::parent_id_for_user;

use super::model::{
    CreateParentDto, LinkChildDto, LinkedChild, PARENT_SELECT, Parent, ParentFilterParams,
    ParentWithChildren, UpdateParentDto,
};

pub struct ParentService;

impl ParentService {
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_parent(db: &PgPool, dto: CreateParentDto) -> Result<Parent, AppError> {
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
                role: UserRole::Parent,
                is_verified: true,
            },
        )
        .await?;

        let parent_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO parents (user_id, occupation, address) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user.id)
        .bind(&dto.occupation)
        .bind(&dto.address)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert parent profile")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_user_created(UserRole::Parent.as_str());
        info!(%parent_id, "Parent created");
        Self::get_parent(db, parent_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_parents(
        db: &PgPool,
        filters: ParentFilterParams,
    ) -> Result<Paginated<Parent>, AppError> {
        let search = like_pattern(filters.search.as_deref());

        const WHERE: &str = "WHERE ($1::text IS NULL OR u.first_name ILIKE $1
              OR u.last_name ILIKE $1 OR u.email ILIKE $1)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM parents p JOIN users u ON u.id = p.user_id {}",
            WHERE
        ))
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count parents")
        .map_err(AppError::database)?;

        let parents = sqlx::query_as::<_, Parent>(&format!(
            "{} {} ORDER BY u.last_name, u.first_name LIMIT $2 OFFSET $3",
            PARENT_SELECT, WHERE
        ))
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch parents")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            parents,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_parent(db: &PgPool, id: Uuid) -> Result<Parent, AppError> {
        sqlx::query_as::<_, Parent>(&format!("{} WHERE p.id = $1", PARENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch parent")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Parent not found")))
    }

    pub async fn get_children(db: &PgPool, parent_id: Uuid) -> Result<Vec<LinkedChild>, AppError> {
        sqlx::query_as::<_, LinkedChild>(
            "SELECT s.id AS student_id, u.first_name, u.last_name, s.admission_number,
                    s.class_id, c.name AS class_name, ps.relationship
             FROM parent_students ps
             JOIN students s ON s.id = ps.student_id
             JOIN users u ON u.id = s.user_id
             LEFT JOIN classes c ON c.id = s.class_id
             WHERE ps.parent_id = $1
             ORDER BY u.first_name",
        )
        .bind(parent_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch linked children")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get_parent_with_children(
        db: &PgPool,
        id: Uuid,
    ) -> Result<ParentWithChildren, AppError> {
        let parent = Self::get_parent(db, id).await?;
        let children = Self::get_children(db, id).await?;
        Ok(ParentWithChildren { parent, children })
    }

    /// Children of the parent account `user_id`.
    #[instrument(skip(db))]
    pub async fn get_my_children(db: &PgPool, user_id: Uuid) -> Result<Vec<LinkedChild>, AppError> {
        let parent_id = parent_id_for_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Parent profile not found")))?;
        Self::get_children(db, parent_id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update_parent(
        db: &PgPool,
        id: Uuid,
        dto: UpdateParentDto,
    ) -> Result<Parent, AppError> {
        let existing = Self::get_parent(db, id).await?;

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
        .context("Failed to update parent account")
        .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE parents SET occupation = $1, address = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(dto.occupation.or(existing.occupation))
        .bind(dto.address.or(existing.address))
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update parent profile")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Self::get_parent(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_parent(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let parent = Self::get_parent(db, id).await?;
        UserService::delete_user_with_role(db, parent.user_id, UserRole::Parent, "Parent not found")
            .await
    }

    #[instrument(skip(db, dto))]
    pub async fn link_child(
        db: &PgPool,
        parent_id: Uuid,
        dto: LinkChildDto,
    ) -> Result<ParentWithChildren, AppError> {
        Self::get_parent(db, parent_id).await?;

        let student_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)")
                .bind(dto.student_id)
                .fetch_one(db)
                .await
                .context("Failed to check student")
                .map_err(AppError::database)?;
        if !student_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        sqlx::query(
            "INSERT INTO parent_students (parent_id, student_id, relationship) VALUES ($1, $2, $3)",
        )
        .bind(parent_id)
        .bind(dto.student_id)
        .bind(dto.relationship.trim())
        .execute(db)
        .await
        .map_err(|e| AppError::from_write(e, "Student is already linked to this parent"))?;

        Self::get_parent_with_children(db, parent_id).await
    }

    #[instrument(skip(db))]
    pub async fn unlink_child(db: &PgPool, parent_id: Uuid, student_id: Uuid) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM parent_students WHERE parent_id = $1 AND student_id = $2")
                .bind(parent_id)
                .bind(student_id)
                .execute(db)
                .await
                .context("Failed to unlink child")
                .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Student is not linked to this parent"
            )));
        }
        Ok(())
    }
}
