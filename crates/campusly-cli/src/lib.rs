//! # Campusly CLI
//!
//! Database seeding utilities for Campusly development and demos.
//!
//! ## Usage
//!
//! ```ignore
//! use campusly_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(6).with_students_per_section(20);
//! seed_all(&pool, &config).await?;
//! ```

pub mod seeder;
