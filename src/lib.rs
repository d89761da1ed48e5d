//! # Campusly API
//!
//! A REST backend for running a school: accounts and invitations, classes and
//! enrollment, exams, attendance, fees, homework, library, transport,
//! messaging and admissions. Built with Axum and PostgreSQL.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # AuthUser extractor and role gates
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Registration, login, OTP verification, password reset
//! │   ├── otp/         # One-time code issue and verification
//! │   ├── invites/     # Staff invitations
//! │   ├── users/       # Accounts and own profile
//! │   ├── students/    # Student profiles and enrollment
//! │   ├── classes/     # Classes and sections
//! │   ├── exams/       # Exams, marks and results
//! │   ├── fees/        # Invoices and payments
//! │   └── ...
//! └── utils/            # Email delivery and record access checks
//! ```
//!
//! Each feature module has the same layout:
//!
//! - `controller.rs`: HTTP handlers with OpenAPI annotations
//! - `service.rs`: Business logic and SQL
//! - `model.rs`: Re-exports from `campusly-models`
//! - `router.rs`: Axum router for the module
//!
//! ## Roles
//!
//! | Role | Can do |
//! |------|--------|
//! | Admin | Everything, including invites, fees and admissions |
//! | Teacher | Exams, marks, attendance, homework, announcements |
//! | Student | Own results, attendance, invoices, homework submissions |
//! | Parent | Linked children's results, attendance and invoices |
//!
//! Students and parents may self-register; staff accounts need an invite.
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

// Re-export workspace crates for convenience
pub use campusly_auth;
pub use campusly_config;
pub use campusly_core;
pub use campusly_db;
pub use campusly_models;
