//! Middleware and extractors for authentication and authorization.
//!
//! - [`auth`]: the [`auth::AuthUser`] extractor that validates the bearer token
//! - [`role`]: role gates, both as route layers and as extractors
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `AuthUser` verifies the JWT and exposes its claims
//! 3. A role gate (`require_admin`, `RequireStaff`, ...) checks the role claim
//! 4. Handlers apply ownership rules (own record, linked child) themselves
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::role::RequireStaff;
//!
//! async fn list_students(RequireStaff(auth_user): RequireStaff) -> impl IntoResponse {
//!     // only admins and teachers get here
//! }
//! ```

pub mod auth;
pub mod role;
