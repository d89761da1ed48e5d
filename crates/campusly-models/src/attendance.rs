//! Attendance sessions and per-student records.
//!
//! A session covers one class (optionally narrowed to a section and/or a
//! subject) on one date. Records can be written while the session is open;
//! closing freezes it until an admin reopens it.

use std::fmt;
use std::str::FromStr;

use campusly_core::PaginationParams;
use campusly_core::serde::deserialize_optional_uuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SessionStatus::Open),
            "closed" => Ok(SessionStatus::Closed),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct AttendanceSession {
    pub id: Uuid,
    pub class_id: Uuid,
    pub section_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub session_date: NaiveDate,
    #[schema(example = "open")]
    pub status: String,
    pub created_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open.as_str()
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub note: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct SessionWithRecords {
    #[serde(flatten)]
    pub session: AttendanceSession,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateSessionDto {
    pub class_id: Uuid,
    pub section_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub session_date: NaiveDate,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct RecordEntry {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

fn unique_students(entries: &[RecordEntry]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    if entries.iter().all(|e| seen.insert(e.student_id)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_student")
            .with_message("Each student may appear only once".into()))
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct RecordAttendanceDto {
    #[validate(
        length(min = 1, max = 500),
        custom(function = "unique_students"),
        nested
    )]
    pub records: Vec<RecordEntry>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    pub session_date: Option<NaiveDate>,
    pub status: Option<SessionStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SummaryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Per-status counts as returned by the summary query.
#[derive(FromRow, Debug, Clone, Default)]
pub struct StatusCounts {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.present + self.absent + self.late + self.excused
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct AttendanceSummary {
    pub student_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// `(present + late) / total * 100`, two decimals
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    pub fn new(student_id: Uuid, query: &SummaryQuery, counts: StatusCounts) -> Self {
        let total = counts.total();
        Self {
            student_id,
            from: query.from,
            to: query.to,
            total,
            present: counts.present,
            absent: counts.absent,
            late: counts.late,
            excused: counts.excused,
            attendance_rate: attendance_rate(counts.present, counts.late, total),
        }
    }
}

pub fn attendance_rate(present: i64, late: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((present + late) as f64 / total as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_rate() {
        assert_eq!(attendance_rate(0, 0, 0), 0.0);
        assert_eq!(attendance_rate(8, 1, 10), 90.0);
        assert_eq!(attendance_rate(1, 0, 3), 33.33);
        assert_eq!(attendance_rate(2, 0, 3), 66.67);
    }

    #[test]
    fn test_summary_from_counts() {
        let counts = StatusCounts {
            present: 15,
            absent: 3,
            late: 1,
            excused: 1,
        };
        let summary = AttendanceSummary::new(Uuid::new_v4(), &SummaryQuery::default(), counts);
        assert_eq!(summary.total, 20);
        assert_eq!(summary.attendance_rate, 80.0);
    }

    #[test]
    fn test_duplicate_students_rejected() {
        let id = Uuid::new_v4();
        let entry = |status| RecordEntry {
            student_id: id,
            status,
            note: None,
        };
        let dto = RecordAttendanceDto {
            records: vec![entry(AttendanceStatus::Present), entry(AttendanceStatus::Absent)],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_entry_note_is_length_checked() {
        let entry = RecordEntry {
            student_id: Uuid::new_v4(),
            status: AttendanceStatus::Late,
            note: Some("x".repeat(501)),
        };
        let dto = RecordAttendanceDto {
            records: vec![entry.clone()],
        };
        assert!(dto.validate().is_err());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "late");

        let ok = RecordAttendanceDto {
            records: vec![RecordEntry {
                note: Some("bus was late".to_string()),
                ..entry
            }],
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_status_wire_format() {
        let entry: RecordEntry = serde_json::from_str(&format!(
            r#"{{"student_id":"{}","status":"excused"}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(entry.status, AttendanceStatus::Excused);
        assert_eq!(entry.status.as_str(), "excused");
    }

    #[test]
    fn test_session_status_parse() {
        assert_eq!("closed".parse::<SessionStatus>().unwrap(), SessionStatus::Closed);
        assert_eq!(SessionStatus::Open.to_string(), "open");
    }
}
