//! Teacher profiles.

use campusly_core::PaginationParams;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Teacher {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_number: String,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const TEACHER_SELECT: &str = "SELECT t.id, t.user_id, u.first_name, u.last_name, u.email, \
     u.phone, t.employee_number, t.qualification, t.specialization, t.hire_date, u.is_active, \
     t.created_at, t.updated_at \
     FROM teachers t JOIN users u ON u.id = t.user_id";

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateTeacherDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_number: String,
    #[validate(length(max = 255))]
    pub qualification: Option<String>,
    #[validate(length(max = 255))]
    pub specialization: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateTeacherDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_number: Option<String>,
    #[validate(length(max = 255))]
    pub qualification: Option<String>,
    #[validate(length(max = 255))]
    pub specialization: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TeacherFilterParams {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_teacher_validation() {
        let dto = CreateTeacherDto {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@school.test".to_string(),
            password: "password123".to_string(),
            phone: None,
            employee_number: "EMP-7".to_string(),
            qualification: Some("MSc".to_string()),
            specialization: Some("Mathematics".to_string()),
            hire_date: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateTeacherDto {
            employee_number: String::new(),
            ..dto
        };
        assert!(dto.validate().is_err());
    }
}
