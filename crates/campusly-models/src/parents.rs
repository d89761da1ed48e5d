//! Parent profiles and their links to students.

use campusly_core::PaginationParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Parent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PARENT_SELECT: &str = "SELECT p.id, p.user_id, u.first_name, u.last_name, u.email, \
     u.phone, p.occupation, p.address, u.is_active, p.created_at, p.updated_at \
     FROM parents p JOIN users u ON u.id = p.user_id";

/// A student linked to a parent.
#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct LinkedChild {
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub admission_number: String,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub relationship: String,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ParentWithChildren {
    #[serde(flatten)]
    pub parent: Parent,
    pub children: Vec<LinkedChild>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateParentDto {
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
    #[validate(length(max = 255))]
    pub occupation: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateParentDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub occupation: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct LinkChildDto {
    pub student_id: Uuid,
    /// e.g. mother, father, guardian
    #[validate(length(min = 1, max = 50))]
    pub relationship: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ParentFilterParams {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_child_requires_relationship() {
        let dto = LinkChildDto {
            student_id: Uuid::new_v4(),
            relationship: String::new(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_parent_with_children_flattens() {
        let parent = Parent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            first_name: "Mary".to_string(),
            last_name: "Doe".to_string(),
            email: "mary@example.com".to_string(),
            phone: None,
            occupation: None,
            address: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(ParentWithChildren {
            parent,
            children: vec![],
        })
        .unwrap();
        assert_eq!(json["first_name"], "Mary");
        assert!(json["children"].as_array().unwrap().is_empty());
    }
}
