//! Direct messages between users.

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_bool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub subject: Option<String>,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, subject, body, read_at, created_at";

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct SendMessageDto {
    pub recipient_id: Uuid,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InboxFilterParams {
    /// `true` to list unread messages only
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub unread: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct UnreadCount {
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_required() {
        let dto = SendMessageDto {
            recipient_id: Uuid::new_v4(),
            subject: None,
            body: String::new(),
        };
        assert!(dto.validate().is_err());
    }
}
