//! Fee invoices and payments.
//!
//! Amounts are integer minor units. An invoice's status is always derived
//! from its amount and the sum of its payments, except `cancelled`, which is
//! terminal and only reachable while nothing has been paid.

use std::fmt;
use std::str::FromStr;

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
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Status implied by `paid_cents` against `amount_cents`.
    pub fn from_amounts(amount_cents: i64, paid_cents: i64) -> Self {
        if paid_cents <= 0 {
            InvoiceStatus::Unpaid
        } else if paid_cents < amount_cents {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Paid
        }
    }

    pub fn accepts_payments(&self) -> bool {
        matches!(self, InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(format!("Unknown invoice status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Online => "online",
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub paid_cents: i64,
    #[schema(example = "unpaid")]
    pub status: String,
    pub due_date: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn balance_cents(&self) -> i64 {
        if self.status == InvoiceStatus::Cancelled.as_str() {
            0
        } else {
            (self.amount_cents - self.paid_cents).max(0)
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.balance_cents() > 0 && self.due_date < today
    }
}

/// An invoice with its derived balance fields.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub balance_cents: i64,
    pub is_overdue: bool,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, today: NaiveDate) -> Self {
        Self {
            balance_cents: invoice.balance_cents(),
            is_overdue: invoice.is_overdue(today),
            invoice,
        }
    }
}

#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount_cents: i64,
    pub method: String,
    pub reference: Option<String>,
    pub received_by: Option<Uuid>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: InvoiceView,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct CreateInvoiceDto {
    pub student_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub due_date: NaiveDate,
}

#[derive(Deserialize, Debug, Clone, ToSchema, Validate)]
pub struct RecordPaymentDto {
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InvoiceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
