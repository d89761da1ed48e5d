//! # Campusly Models
//!
//! Domain models and DTOs for the Campusly API: database rows, request and
//! response bodies, query filters and the status enums that drive each
//! workflow.
//!
//! Status columns are stored as text; each enum here provides `as_str()` for
//! writing and `FromStr` for reading them back.
//!
//! # Example
//!
//! ```ignore
//! use campusly_models::fees::{InvoiceStatus, Invoice};
//!
//! let next = InvoiceStatus::from_amounts(invoice.amount_cents, invoice.paid_cents + payment);
//! ```

pub mod admissions;
pub mod announcements;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod exams;
pub mod fees;
pub mod homework;
pub mod invites;
pub mod library;
pub mod messages;
pub mod otp;
pub mod parents;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod transport;
pub mod users;

// Re-export commonly used types at crate root for convenience
pub use auth::{Claims, LoginRequest, LoginResponse, MessageResponse, RefreshTokenClaims};
pub use users::{User, UserRole};
