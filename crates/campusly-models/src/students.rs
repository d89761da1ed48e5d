//! Student domain models and DTOs.
//!
//! A student is a `users` row with role `student` plus a `students` profile
//! row holding enrollment data.

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_uuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A student profile joined with its user and enrollment names.
#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub admission_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub section_id: Option<Uuid>,
    pub section_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared `SELECT ... FROM` clause producing [`Student`] rows.
pub const STUDENT_SELECT: &str = "SELECT s.id, s.user_id, u.first_name, u.last_name, u.email, \
     u.phone, s.admission_number, s.date_of_birth, s.gender, s.address, s.class_id, \
     c.name AS class_name, s.section_id, sec.name AS section_name, u.is_active, \
     s.created_at, s.updated_at \
     FROM students s \
     JOIN users u ON u.id = s.user_id \
     LEFT JOIN classes c ON c.id = s.class_id \
     LEFT JOIN sections sec ON sec.id = s.section_id";

fn section_needs_class(dto: &CreateStudentDto) -> Result<(), ValidationError> {
    if dto.section_id.is_some() && dto.class_id.is_none() {
        return Err(ValidationError::new("section_without_class")
            .with_message("section_id requires class_id".into()));
    }
    Ok(())
}

/// DTO for creating a student account and profile together.
#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
#[validate(schema(function = "section_needs_class"))]
pub struct CreateStudentDto {
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
    pub admission_number: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

/// DTO for updating a student. Only provided fields are changed.
#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub admission_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub address: Option<String>,
    pub class_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StudentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub section_id: Option<Uuid>,
    /// Matches name, email or admission number.
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dto() -> CreateStudentDto {
        CreateStudentDto {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            password: "password123".to_string(),
            phone: None,
            admission_number: "ADM-0001".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 4, 1),
            gender: Some("male".to_string()),
            address: None,
            class_id: Some(Uuid::new_v4()),
            section_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_create_student_dto_validation() {
        assert!(valid_dto().validate().is_ok());
    }

    #[test]
    fn test_create_student_dto_invalid_email() {
        let dto = CreateStudentDto {
            email: "invalid-email".to_string(),
            ..valid_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_student_dto_empty_admission_number() {
        let dto = CreateStudentDto {
            admission_number: String::new(),
            ..valid_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_section_requires_class() {
        let dto = CreateStudentDto {
            class_id: None,
            ..valid_dto()
        };
        assert!(dto.validate().is_err());

        let dto = CreateStudentDto {
            class_id: None,
            section_id: None,
            ..valid_dto()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_filter_params_empty_values() {
        let p: StudentFilterParams =
            serde_json::from_str(r#"{"class_id":"","search":"doe"}"#).unwrap();
        assert!(p.class_id.is_none());
        assert_eq!(p.search.as_deref(), Some("doe"));
        assert_eq!(p.pagination.limit(), 10);
    }
}
