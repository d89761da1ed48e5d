//! Library catalogue and loans.

use campusly_core::PaginationParams;
use campusly_core::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    #[schema(example = "978-0-13-110362-7")]
    pub isbn: String,
    pub category: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateBookDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    #[validate(length(min = 10, max = 20))]
    pub isbn: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 1))]
    pub total_copies: i32,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, Validate)]
pub struct UpdateBookDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 20))]
    pub isbn: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 1))]
    pub total_copies: Option<i32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BookFilterParams {
    /// Matches title, author or ISBN.
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: String,
    pub borrower_id: Uuid,
    pub issued_by: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_cents: i64,
}

pub const LOAN_SELECT: &str = "SELECT l.id, l.book_id, b.title AS book_title, l.borrower_id, \
     l.issued_by, l.issued_at, l.due_date, l.returned_at, l.fine_cents \
     FROM library_loans l JOIN library_books b ON b.id = l.book_id";

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateLoanDto {
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub due_date: NaiveDate,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoanFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub borrower_id: Option<Uuid>,
    /// `true` for loans not yet returned
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Whole days between the due date and the return date, times the daily fine.
pub fn overdue_fine(due_date: NaiveDate, returned_on: NaiveDate, fine_per_day_cents: i64) -> i64 {
    let days_late = (returned_on - due_date).num_days().max(0);
    days_late * fine_per_day_cents
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_no_fine_on_or_before_due() {
        assert_eq!(overdue_fine(date(10), date(10), 50), 0);
        assert_eq!(overdue_fine(date(10), date(3), 50), 0);
    }

    #[test]
    fn test_fine_per_day_late() {
        assert_eq!(overdue_fine(date(10), date(13), 50), 150);
        assert_eq!(overdue_fine(date(10), date(11), 25), 25);
    }

    #[test]
    fn test_create_book_validation() {
        let dto = CreateBookDto {
            title: "The C Programming Language".to_string(),
            author: "Kernighan & Ritchie".to_string(),
            isbn: "978-0131103627".to_string(),
            category: None,
            total_copies: 0,
        };
        assert!(dto.validate().is_err());
        let dto = CreateBookDto {
            total_copies: 2,
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_loan_filter_active_flag() {
        let p: LoanFilterParams = serde_json::from_str(r#"{"active":"1"}"#).unwrap();
        assert_eq!(p.active, Some(true));
    }
}
