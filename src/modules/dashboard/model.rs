pub use campusly_models::dashboard::DashboardStats;
