use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::students::service::StudentService;

use super::model::{
    AssignStudentDto, CreateRouteDto, RouteAssignment, RouteFilterParams, RouteStudent,
    RouteWithCount, TransportRoute, UpdateRouteDto,
};

const ROUTE_WITH_COUNT_SELECT: &str = "SELECT r.*,
        (SELECT COUNT(*) FROM transport_assignments a WHERE a.route_id = r.id) AS assigned_count
     FROM transport_routes r";

const DUPLICATE_NAME: &str = "A route with this name already exists";

async fn assigned_count(conn: &mut PgConnection, route_id: Uuid) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transport_assignments WHERE route_id = $1")
        .bind(route_id)
        .fetch_one(conn)
        .await
        .context("Failed to count route assignments")
        .map_err(AppError::database)
}

pub struct TransportService;

impl TransportService {
    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_route(db: &PgPool, dto: CreateRouteDto) -> Result<TransportRoute, AppError> {
        let route = sqlx::query_as::<_, TransportRoute>(
            "INSERT INTO transport_routes
                (name, description, vehicle_number, driver_name, driver_phone, capacity, fare_cents)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(dto.name.trim())
        .bind(&dto.description)
        .bind(dto.vehicle_number.trim())
        .bind(dto.driver_name.trim())
        .bind(dto.driver_phone.trim())
        .bind(dto.capacity)
        .bind(dto.fare_cents)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_NAME))?;

        info!(route_id = %route.id, "Transport route created");
        Ok(route)
    }

    #[instrument(skip(db))]
    pub async fn list_routes(
        db: &PgPool,
        filters: RouteFilterParams,
    ) -> Result<Paginated<RouteWithCount>, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transport_routes")
            .fetch_one(db)
            .await
            .context("Failed to count routes")
            .map_err(AppError::database)?;

        let routes = sqlx::query_as::<_, RouteWithCount>(&format!(
            "{} ORDER BY r.name LIMIT $1 OFFSET $2",
            ROUTE_WITH_COUNT_SELECT
        ))
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch routes")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            routes,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_route(db: &PgPool, id: Uuid) -> Result<RouteWithCount, AppError> {
        sqlx::query_as::<_, RouteWithCount>(&format!(
            "{} WHERE r.id = $1",
            ROUTE_WITH_COUNT_SELECT
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch route")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Route not found")))
    }

    async fn lock_route(conn: &mut PgConnection, id: Uuid) -> Result<TransportRoute, AppError> {
        sqlx::query_as::<_, TransportRoute>(
            "SELECT * FROM transport_routes WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("Failed to lock route")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Route not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_route(
        db: &PgPool,
        id: Uuid,
        dto: UpdateRouteDto,
    ) -> Result<RouteWithCount, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let existing = Self::lock_route(&mut tx, id).await?;
        if let Some(capacity) = dto.capacity {
            let assigned = assigned_count(&mut tx, id).await?;
            if assigned > i64::from(capacity) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Capacity cannot be below the {} students already assigned",
                    assigned
                )));
            }
        }

        sqlx::query(
            "UPDATE transport_routes
             SET name = $1, description = $2, vehicle_number = $3, driver_name = $4,
                 driver_phone = $5, capacity = $6, fare_cents = $7, updated_at = NOW()
             WHERE id = $8",
        )
        .bind(dto.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(dto.description.or(existing.description))
        .bind(
            dto.vehicle_number
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.vehicle_number),
        )
        .bind(
            dto.driver_name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.driver_name),
        )
        .bind(
            dto.driver_phone
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.driver_phone),
        )
        .bind(dto.capacity.unwrap_or(existing.capacity))
        .bind(dto.fare_cents.unwrap_or(existing.fare_cents))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_NAME))?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Self::get_route(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_route(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let route = Self::get_route(db, id).await?;
        if route.assigned_count > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete a route with assigned students"
            )));
        }

        sqlx::query("DELETE FROM transport_routes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| AppError::from_write(e, "Cannot delete a route with assigned students"))?;

        info!(route_id = %id, "Transport route deleted");
        Ok(())
    }

    /// Assigns a student to the route, moving them off any previous route.
    #[instrument(skip(db, dto), fields(student_id = %dto.student_id))]
    pub async fn assign_student(
        db: &PgPool,
        route_id: Uuid,
        dto: AssignStudentDto,
    ) -> Result<RouteAssignment, AppError> {
        StudentService::get_student(db, dto.student_id).await?;

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let route = Self::lock_route(&mut tx, route_id).await?;

        let riders = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transport_assignments WHERE route_id = $1 AND student_id <> $2",
        )
        .bind(route_id)
        .bind(dto.student_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count route assignments")
        .map_err(AppError::database)?;

        if riders >= i64::from(route.capacity) {
            return Err(AppError::conflict(anyhow::anyhow!("Route is full")));
        }

        let assignment = sqlx::query_as::<_, RouteAssignment>(
            "INSERT INTO transport_assignments (route_id, student_id, pickup_point)
             VALUES ($1, $2, $3)
             ON CONFLICT (student_id) DO UPDATE
             SET route_id = EXCLUDED.route_id,
                 pickup_point = EXCLUDED.pickup_point,
                 created_at = NOW()
             RETURNING *",
        )
        .bind(route_id)
        .bind(dto.student_id)
        .bind(dto.pickup_point.trim())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to assign student")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(%route_id, student_id = %dto.student_id, "Student assigned to route");
        Ok(assignment)
    }

    #[instrument(skip(db))]
    pub async fn unassign_student(
        db: &PgPool,
        route_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM transport_assignments WHERE route_id = $1 AND student_id = $2",
        )
        .bind(route_id)
        .bind(student_id)
        .execute(db)
        .await
        .context("Failed to unassign student")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Student is not assigned to this route"
            )));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn route_students(db: &PgPool, route_id: Uuid) -> Result<Vec<RouteStudent>, AppError> {
        Self::get_route(db, route_id).await?;

        sqlx::query_as::<_, RouteStudent>(
            "SELECT a.student_id, u.first_name, u.last_name, s.admission_number,
                    a.pickup_point, a.created_at AS assigned_at
             FROM transport_assignments a
             JOIN students s ON s.id = a.student_id
             JOIN users u ON u.id = s.user_id
             WHERE a.route_id = $1
             ORDER BY a.pickup_point, u.last_name",
        )
        .bind(route_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch route students")
        .map_err(AppError::database)
    }
}
