pub use campusly_auth::{OtpCheck, OtpPurpose};
pub use campusly_models::otp::OtpCode;
