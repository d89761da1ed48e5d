use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Fine charged per full day a loan is overdue, in minor units.
    pub fine_per_day_cents: i64,
    /// Maximum concurrent unreturned loans per borrower.
    pub max_active_loans: i64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            fine_per_day_cents: 50,
            max_active_loans: 3,
        }
    }
}

impl LibraryConfig {
    pub fn from_env() -> Self {
        Self {
            fine_per_day_cents: env_or("LIBRARY_FINE_PER_DAY_CENTS", 50),
            max_active_loans: env_or("LIBRARY_MAX_ACTIVE_LOANS", 3),
        }
    }
}
