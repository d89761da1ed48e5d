//! Classes (a grade in an academic year) and their sections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use campusly_core::PaginationParams;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Class {
    pub id: Uuid,
    #[schema(example = "Grade 5")]
    pub name: String,
    #[schema(example = "2025/2026")]
    pub academic_year: String,
    pub class_teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Section {
    pub id: Uuid,
    pub class_id: Uuid,
    pub name: String,
    /// `None` means unlimited
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct SectionWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub section: Section,
    pub student_count: i64,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: Class,
    pub sections: Vec<SectionWithCount>,
    pub student_count: i64,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 4, max = 20))]
    pub academic_year: String,
    pub class_teacher_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 4, max = 20))]
    pub academic_year: Option<String>,
    pub class_teacher_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ClassFilterParams {
    pub academic_year: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateSectionDto {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateSectionDto {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

/// Whether a section with `capacity` can take one more student.
pub fn has_room(capacity: Option<i32>, enrolled: i64) -> bool {
    capacity.is_none_or(|cap| enrolled < i64::from(cap))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_room() {
        assert!(has_room(None, 10_000));
        assert!(has_room(Some(30), 29));
        assert!(!has_room(Some(30), 30));
        assert!(!has_room(Some(1), 5));
    }

    #[test]
    fn test_section_capacity_must_be_positive() {
        let dto = CreateSectionDto {
            name: "A".to_string(),
            capacity: Some(0),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_class_validation() {
        let dto = CreateClassDto {
            name: "Grade 1".to_string(),
            academic_year: "2025/2026".to_string(),
            class_teacher_id: None,
        };
        assert!(dto.validate().is_ok());
        let dto = CreateClassDto {
            academic_year: "25".to_string(),
            ..dto
        };
        assert!(dto.validate().is_err());
    }
}
