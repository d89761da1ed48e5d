//! Subjects taught in a class.

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_uuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "MATH-5")]
    pub code: String,
    pub class_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub class_id: Uuid,
    pub teacher_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    pub class_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_length() {
        let dto = CreateSubjectDto {
            name: "Mathematics".to_string(),
            code: "X".repeat(21),
            class_id: Uuid::new_v4(),
            teacher_id: None,
        };
        assert!(dto.validate().is_err());
    }
}
