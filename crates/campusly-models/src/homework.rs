//! Homework assignments and student submissions.

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_uuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Late,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Late => "late",
            SubmissionStatus::Graded => "graded",
        }
    }

    /// Status of a fresh submission made on `submitted_on`.
    pub fn on_submit(due_date: NaiveDate, submitted_on: NaiveDate) -> Self {
        if submitted_on > due_date {
            SubmissionStatus::Late
        } else {
            SubmissionStatus::Submitted
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Homework {
    pub id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateHomeworkDto {
    pub class_id: Uuid,
    pub subject_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateHomeworkDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HomeworkFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub homework_id: Uuid,
    pub student_id: Uuid,
    pub content: String,
    #[schema(example = "submitted")]
    pub status: String,
    pub grade: Option<String>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<Uuid>,
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.status == SubmissionStatus::Graded.as_str()
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct SubmitHomeworkDto {
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct GradeSubmissionDto {
    #[validate(length(min = 1, max = 20))]
    #[schema(example = "A-")]
    pub grade: String,
    pub feedback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_submit_status() {
        let due = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            SubmissionStatus::on_submit(due, due),
            SubmissionStatus::Submitted
        );
        assert_eq!(
            SubmissionStatus::on_submit(due, due.pred_opt().unwrap()),
            SubmissionStatus::Submitted
        );
        assert_eq!(
            SubmissionStatus::on_submit(due, due.succ_opt().unwrap()),
            SubmissionStatus::Late
        );
    }

    #[test]
    fn test_grade_required() {
        let dto = GradeSubmissionDto {
            grade: String::new(),
            feedback: None,
        };
        assert!(dto.validate().is_err());
    }
}
