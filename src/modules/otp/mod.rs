//! One-time code persistence. The endpoints that use it live under `/auth`.

pub mod model;
pub mod service;
