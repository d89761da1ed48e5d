pub mod access;
pub mod email;
