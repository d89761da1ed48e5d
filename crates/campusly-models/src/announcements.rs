//! School-wide announcements targeted at an audience.

use std::str::FromStr;

use campusly_core::PaginationParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::users::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Admin => "admin",
            Audience::Teacher => "teacher",
            Audience::Student => "student",
            Audience::Parent => "parent",
        }
    }

    pub fn for_role(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Audience::Admin,
            UserRole::Teacher => Audience::Teacher,
            UserRole::Student => Audience::Student,
            UserRole::Parent => Audience::Parent,
        }
    }

    pub fn includes(&self, role: UserRole) -> bool {
        *self == Audience::All || *self == Audience::for_role(role)
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Audience::All),
            "admin" => Ok(Audience::Admin),
            "teacher" => Ok(Audience::Teacher),
            "student" => Ok(Audience::Student),
            "parent" => Ok(Audience::Parent),
            other => Err(format!("Unknown audience: {}", other)),
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[schema(example = "all")]
    pub audience: String,
    pub author_id: Option<Uuid>,
    pub publish_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        is_live(self.publish_at, self.expires_at, now)
    }

    /// Whether a user with `role` may see this announcement at `now`.
    pub fn visible_to(&self, role: UserRole, now: DateTime<Utc>) -> bool {
        if role == UserRole::Admin {
            return true;
        }
        let audience_ok = self
            .audience
            .parse::<Audience>()
            .map(|a| a.includes(role))
            .unwrap_or(false);
        audience_ok && self.is_live(now)
    }
}

pub fn is_live(
    publish_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    publish_at <= now && expires_at.is_none_or(|exp| now < exp)
}

fn window_is_ordered(dto: &CreateAnnouncementDto) -> Result<(), ValidationError> {
    match (dto.publish_at, dto.expires_at) {
        (Some(p), Some(e)) if e <= p => Err(ValidationError::new("expires_at")
            .with_message("expires_at must be after publish_at".into())),
        _ => Ok(()),
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
#[validate(schema(function = "window_is_ordered"))]
pub struct CreateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    pub audience: Audience,
    /// Defaults to now
    pub publish_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub audience: Option<Audience>,
    pub publish_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AnnouncementFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
