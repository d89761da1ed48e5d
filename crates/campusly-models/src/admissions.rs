//! Admission applications.
//!
//! ```text
//! submitted ─▶ assessment_scheduled ─▶ assessed ─▶ accepted
//!     └──────────────┴──────────────────┴────────▶ rejected
//! ```

use std::fmt;
use std::str::FromStr;

use campusly_core::PaginationParams;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::students::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Submitted,
    AssessmentScheduled,
    Assessed,
    Accepted,
    Rejected,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionStatus::Submitted => "submitted",
            AdmissionStatus::AssessmentScheduled => "assessment_scheduled",
            AdmissionStatus::Assessed => "assessed",
            AdmissionStatus::Accepted => "accepted",
            AdmissionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AdmissionStatus::Accepted | AdmissionStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: AdmissionStatus) -> bool {
        use AdmissionStatus::*;
        matches!(
            (self, next),
            (Submitted, AssessmentScheduled)
                | (AssessmentScheduled, Assessed)
                | (Assessed, Accepted)
                | (Submitted, Rejected)
                | (AssessmentScheduled, Rejected)
                | (Assessed, Rejected)
        )
    }

    /// Checks a transition, returning a client-facing message when illegal.
    pub fn transition(self, next: AdmissionStatus) -> Result<AdmissionStatus, String> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(format!(
                "Cannot move application from {} to {}",
                self.as_str(),
                next.as_str()
            ))
        }
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(AdmissionStatus::Submitted),
            "assessment_scheduled" => Ok(AdmissionStatus::AssessmentScheduled),
            "assessed" => Ok(AdmissionStatus::Assessed),
            "accepted" => Ok(AdmissionStatus::Accepted),
            "rejected" => Ok(AdmissionStatus::Rejected),
            other => Err(format!("Unknown admission status: {}", other)),
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Admission {
    pub id: Uuid,
    pub applicant_first_name: String,
    pub applicant_last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub guardian_name: String,
    pub guardian_email: String,
    pub guardian_phone: String,
    pub desired_class_id: Option<Uuid>,
    pub previous_school: Option<String>,
    #[schema(example = "submitted")]
    pub status: String,
    pub assessment_date: Option<NaiveDate>,
    pub assessment_score: Option<i32>,
    pub assessment_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub student_id: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateAdmissionDto {
    #[validate(length(min = 1, max = 100))]
    pub applicant_first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub applicant_last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub guardian_name: String,
    #[validate(email)]
    pub guardian_email: String,
    #[validate(length(min = 3, max = 32))]
    pub guardian_phone: String,
    pub desired_class_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub previous_school: Option<String>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct ScheduleAssessmentDto {
    pub assessment_date: NaiveDate,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct RecordAssessmentDto {
    #[validate(range(min = 0, max = 100))]
    pub score: i32,
    pub notes: Option<String>,
}

/// Accepting creates the student's account; these are its credentials and
/// placement.
#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct AcceptAdmissionDto {
    #[validate(length(min = 1, max = 50))]
    pub admission_number: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// Defaults to the desired class
    pub class_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct RejectAdmissionDto {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct AcceptedAdmission {
    pub admission: Admission,
    pub student: Student,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdmissionFilterParams {
    pub status: Option<AdmissionStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AdmissionStatus::*;

    #[test]
    fn test_happy_path() {
        assert_eq!(Submitted.transition(AssessmentScheduled), Ok(AssessmentScheduled));
        assert_eq!(AssessmentScheduled.transition(Assessed), Ok(Assessed));
        assert_eq!(Assessed.transition(Accepted), Ok(Accepted));
    }

    #[test]
    fn test_reject_from_any_open_state() {
        for from in [Submitted, AssessmentScheduled, Assessed] {
            assert!(from.can_transition_to(Rejected));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [Accepted, Rejected] {
            assert!(from.is_terminal());
            for to in [Submitted, AssessmentScheduled, Assessed, Accepted, Rejected] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_cannot_skip_assessment() {
        let err = Submitted.transition(Accepted).unwrap_err();
        assert_eq!(err, "Cannot move application from submitted to accepted");
        assert!(!Submitted.can_transition_to(Assessed));
    }

    #[test]
    fn test_score_range() {
        assert!(RecordAssessmentDto { score: 101, notes: None }.validate().is_err());
        assert!(RecordAssessmentDto { score: 0, notes: None }.validate().is_ok());
    }
}
