//! # Campusly Core
//!
//! Foundational types used throughout the Campusly API:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters, metadata and paged responses
//! - [`password`]: bcrypt password hashing and verification
//! - [`serde`]: Lenient query-string deserializers

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
