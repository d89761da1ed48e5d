//! Transport routes and student assignments.

use campusly_core::PaginationParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct TransportRoute {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub vehicle_number: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub capacity: i32,
    pub fare_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct RouteWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub route: TransportRoute,
    pub assigned_count: i64,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateRouteDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_number: String,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: String,
    #[validate(length(min = 1, max = 32))]
    pub driver_phone: String,
    #[validate(range(min = 1))]
    pub capacity: i32,
    #[validate(range(min = 0))]
    pub fare_cents: i64,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateRouteDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_number: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub driver_name: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub driver_phone: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(range(min = 0))]
    pub fare_cents: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct AssignStudentDto {
    pub student_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub pickup_point: String,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct RouteStudent {
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub admission_number: String,
    pub pickup_point: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct RouteAssignment {
    pub id: Uuid,
    pub route_id: Uuid,
    pub student_id: Uuid,
    pub pickup_point: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RouteFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_validation() {
        let dto = CreateRouteDto {
            name: "North Loop".to_string(),
            description: None,
            vehicle_number: "BUS-12".to_string(),
            driver_name: "Sam".to_string(),
            driver_phone: "+1555000111".to_string(),
            capacity: 40,
            fare_cents: 1500,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateRouteDto {
            capacity: 0,
            fare_cents: -1,
            ..dto
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("capacity"));
        assert!(errors.field_errors().contains_key("fare_cents"));
    }
}
