use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta, hash_password, verify_password};
use campusly_observability::track_user_created;
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    ChangePasswordDto, CreateUserDto, USER_COLUMNS, UpdateProfileDto, UpdateUserDto, User,
    UserCredentials, UserFilterParams, UserRole, like_pattern,
};

/// Fields for a new `users` row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub is_verified: bool,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct UserService;

impl UserService {
    /// Inserts a user. Works on a pool or inside a caller's transaction.
    ///
    /// Callers record `track_user_created` once the row is committed.
    #[instrument(skip(executor, new_user), fields(email = %new_user.email, role = %new_user.role))]
    pub async fn insert_user<'e>(
        executor: impl PgExecutor<'e>,
        new_user: NewUser<'_>,
    ) -> Result<User, AppError> {
        let email = normalize_email(new_user.email);
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, phone, password_hash, role, is_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(new_user.first_name.trim())
        .bind(new_user.last_name.trim())
        .bind(&email)
        .bind(new_user.phone)
        .bind(new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(new_user.is_verified)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_write(e, &format!("User with email {} already exists", email))
        })?;

        Ok(user)
    }

    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let password_hash = hash_password(&dto.password)?;
        let user = Self::insert_user(
            db,
            NewUser {
                first_name: &dto.first_name,
                last_name: &dto.last_name,
                email: &dto.email,
                phone: dto.phone.as_deref(),
                password_hash: &password_hash,
                role: dto.role,
                is_verified: true,
            },
        )
        .await?;

        track_user_created(&user.role);
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch user")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_user_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by email")
        .map_err(AppError::database)
    }

    pub async fn get_credentials_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, role, password_hash, is_verified, is_active
             FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await
        .context("Failed to fetch credentials")
        .map_err(AppError::database)
    }

    /// Fails with 400 unless `id` is an existing user holding `role`.
    pub async fn ensure_role(
        db: &PgPool,
        id: Uuid,
        role: UserRole,
        label: &str,
    ) -> Result<(), AppError> {
        let actual = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch user role")
            .map_err(AppError::database)?;

        match actual {
            Some(r) if r == role.as_str() => Ok(()),
            Some(_) => Err(AppError::bad_request(anyhow::anyhow!(
                "{} must be a user with role {}",
                label,
                role
            ))),
            None => Err(AppError::bad_request(anyhow::anyhow!("{} not found", label))),
        }
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<Paginated<User>, AppError> {
        let role = filters.role.map(|r| r.as_str());
        let search = like_pattern(filters.search.as_deref());
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        const WHERE: &str = "WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2)
              AND ($3::boolean IS NULL OR is_active = $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {}", WHERE))
            .bind(role)
            .bind(&search)
            .bind(filters.is_active)
            .fetch_one(db)
            .await
            .context("Failed to count users")
            .map_err(AppError::database)?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users {} ORDER BY last_name, first_name LIMIT $4 OFFSET $5",
            USER_COLUMNS, WHERE
        ))
        .bind(role)
        .bind(&search)
        .bind(filters.is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("Failed to fetch users")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            users,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(db: &PgPool, id: Uuid, dto: UpdateUserDto) -> Result<User, AppError> {
        let existing = Self::get_user(db, id).await?;

        let email = dto
            .email
            .as_deref()
            .map(normalize_email)
            .unwrap_or(existing.email);
        let role = dto.role.map(|r| r.as_str().to_string()).unwrap_or(existing.role);

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, email = $3, phone = $4, role = $5, updated_at = NOW()
             WHERE id = $6
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(&email)
        .bind(dto.phone.or(existing.phone))
        .bind(role)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, &format!("User with email {} already exists", email)))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id).await?;

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET first_name = $1, last_name = $2, phone = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.first_name.unwrap_or(existing.first_name))
        .bind(dto.last_name.unwrap_or(existing.last_name))
        .bind(dto.phone.or(existing.phone))
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update profile")
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<User, AppError> {
        let current_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch password")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        if dto.current_password == dto.new_password {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "New password must differ from the current password"
            )));
        }

        Self::set_password(db, id, &dto.new_password).await
    }

    pub async fn set_password(db: &PgPool, id: Uuid, new_password: &str) -> Result<User, AppError> {
        let password_hash = hash_password(new_password)?;
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(password_hash)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update password")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn set_active(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<User, AppError> {
        if actor_id == id && !is_active {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot deactivate your own account"
            )));
        }

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(is_active)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update user status")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if actor_id == id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| AppError::from_write(e, "User is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        Ok(())
    }

    /// Deletes a user only when it holds `role`.
    pub async fn delete_user_with_role(
        db: &PgPool,
        id: Uuid,
        role: UserRole,
        not_found: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(role.as_str())
            .execute(db)
            .await
            .map_err(|e| AppError::from_write(e, "Record is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("{}", not_found)));
        }

        Ok(())
    }
}
