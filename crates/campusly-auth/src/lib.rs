//! # Campusly Auth
//!
//! Authentication building blocks for the Campusly API:
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification
//! - [`otp`]: One-time verification codes and their check outcomes
//! - [`invite`]: Invite token status machine
//! - [`tokens`]: Random token generation and digest helpers
//!
//! Nothing in this crate touches the database; services load rows, hand the
//! relevant fields to these functions and persist the outcome.
//!
//! # Example
//!
//! ```ignore
//! use campusly_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "t@school.test", "teacher", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, "teacher");
//! ```

pub mod claims;
pub mod invite;
pub mod jwt;
pub mod otp;
pub mod tokens;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims};
pub use invite::{InviteError, InviteState, InviteStatus, Redemption};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use otp::{OtpCheck, OtpPurpose, OtpState};
pub use tokens::sha256_hex;
