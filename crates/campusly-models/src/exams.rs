//! Exams, mark entry and published results.
//!
//! An exam starts as `draft`; marks may be entered and the exam edited only
//! while it is a draft. Publishing freezes it and makes results visible to
//! students and parents.

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
pub enum ExamStatus {
    Draft,
    Published,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Draft => "draft",
            ExamStatus::Published => "published",
        }
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ExamStatus::Draft),
            "published" => Ok(ExamStatus::Published),
            other => Err(format!("Unknown exam status: {}", other)),
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Exam {
    pub id: Uuid,
    pub name: String,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub exam_date: NaiveDate,
    pub max_marks: i32,
    pub pass_marks: i32,
    #[schema(example = "draft")]
    pub status: String,
    pub created_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    pub fn is_draft(&self) -> bool {
        self.status == ExamStatus::Draft.as_str()
    }
}

fn pass_within_max(dto: &CreateExamDto) -> Result<(), ValidationError> {
    if dto.pass_marks > dto.max_marks {
        return Err(ValidationError::new("pass_marks")
            .with_message("pass_marks cannot exceed max_marks".into()));
    }
    Ok(())
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
#[validate(schema(function = "pass_within_max"))]
pub struct CreateExamDto {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub exam_date: NaiveDate,
    #[validate(range(min = 1))]
    pub max_marks: i32,
    #[validate(range(min = 0))]
    pub pass_marks: i32,
}

/// Partial update; the combined max/pass check runs in the service against
/// the stored values.
#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateExamDto {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub exam_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub max_marks: Option<i32>,
    #[validate(range(min = 0))]
    pub pass_marks: Option<i32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExamFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    pub status: Option<ExamStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct MarkEntry {
    pub student_id: Uuid,
    #[validate(range(min = 0))]
    pub marks_obtained: i32,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct EnterMarksDto {
    #[validate(length(min = 1, max = 500), nested)]
    pub entries: Vec<MarkEntry>,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct ExamMark {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub admission_number: String,
    pub marks_obtained: i32,
    pub remarks: Option<String>,
    pub entered_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Raw result row before grading.
#[derive(FromRow, Debug, Clone)]
pub struct ResultRow {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub exam_date: NaiveDate,
    pub max_marks: i32,
    pub pass_marks: i32,
    pub marks_obtained: i32,
    pub remarks: Option<String>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct StudentResult {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub exam_date: NaiveDate,
    pub max_marks: i32,
    pub pass_marks: i32,
    pub marks_obtained: i32,
    pub percentage: f64,
    #[schema(example = "B")]
    pub grade: String,
    pub passed: bool,
    pub remarks: Option<String>,
}

impl From<ResultRow> for StudentResult {
    fn from(row: ResultRow) -> Self {
        let ratio = score_ratio(row.marks_obtained, row.max_marks);
        Self {
            exam_id: row.exam_id,
            exam_name: row.exam_name,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            exam_date: row.exam_date,
            max_marks: row.max_marks,
            pass_marks: row.pass_marks,
            marks_obtained: row.marks_obtained,
            percentage: round_percentage(ratio),
            grade: letter_grade(ratio * 100.0).to_string(),
            passed: row.marks_obtained >= row.pass_marks,
            remarks: row.remarks,
        }
    }
}

/// `marks / max` unrounded; 0 when `max` is not positive.
pub fn score_ratio(marks: i32, max: i32) -> f64 {
    if max <= 0 {
        return 0.0;
    }
    f64::from(marks) / f64::from(max)
}

fn round_percentage(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 100.0
}

/// Percentage rounded to two decimals; 0 when `max` is not positive.
pub fn percentage(marks: i32, max: i32) -> f64 {
    round_percentage(score_ratio(marks, max))
}

/// Letter grade for an unrounded percentage.

pub fn letter_grade(percentage: f64) -> &'static str {
    match percentage {
        p if p >= 80.0 => "A",
        p if p >= 65.0 => "B",
        p if p >= 50.0 => "C",
        p if p >= 40.0 => "D",
        _ => "F",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto(max: i32, pass: i32) -> CreateExamDto {
        CreateExamDto {
            name: "Midterm".to_string(),
            class_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            exam_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            max_marks: max,
            pass_marks: pass,
        }
    }

    #[test]
    fn test_pass_marks_cannot_exceed_max() {
        assert!(create_dto(100, 40).validate().is_ok());
        assert!(create_dto(100, 100).validate().is_ok());
        assert!(create_dto(50, 60).validate().is_err());
        assert!(create_dto(0, 0).validate().is_err());
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(letter_grade(100.0), "A");
        assert_eq!(letter_grade(80.0), "A");
        assert_eq!(letter_grade(79.99), "B");
        assert_eq!(letter_grade(65.0), "B");
        assert_eq!(letter_grade(50.0), "C");
        assert_eq!(letter_grade(40.0), "D");
        assert_eq!(letter_grade(39.5), "F");
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(50, 50), 100.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_result_from_row() {
        let result = StudentResult::from(ResultRow {
            exam_id: Uuid::new_v4(),
            exam_name: "Final".to_string(),
            subject_id: Uuid::new_v4(),
            subject_name: "Science".to_string(),
            exam_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            max_marks: 80,
            pass_marks: 32,
            marks_obtained: 30,
            remarks: None,
        });
        assert_eq!(result.percentage, 37.5);
        assert_eq!(result.grade, "F");
        assert!(!result.passed);
    }

    #[test]
    fn test_grade_uses_unrounded_score() {
        let result = StudentResult::from(ResultRow {
            exam_id: Uuid::new_v4(),
            exam_name: "Final".to_string(),
            subject_id: Uuid::new_v4(),
            subject_name: "Mathematics".to_string(),
            exam_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            max_marks: 25_000,
            pass_marks: 10_000,
            marks_obtained: 19_999,
            remarks: None,
        });
        // 79.996% displays as 80.0 but is still below the A boundary.
        assert_eq!(result.percentage, 80.0);
        assert_eq!(result.grade, "B");
        assert!(result.passed);
    }

    #[test]
    fn test_enter_marks_validates_entries() {
        let dto = EnterMarksDto {
            entries: vec![MarkEntry {
                student_id: Uuid::new_v4(),
                marks_obtained: -1,
                remarks: None,
            }],
        };
        assert!(dto.validate().is_err());

        let empty = EnterMarksDto { entries: vec![] };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!("published".parse::<ExamStatus>().unwrap(), ExamStatus::Published);
        assert!("archived".parse::<ExamStatus>().is_err());
    }
}
