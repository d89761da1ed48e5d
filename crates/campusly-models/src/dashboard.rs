use serde::Serialize;
use utoipa::ToSchema;

/// Headline numbers for the admin dashboard.
#[derive(Serialize, Debug, Clone, Default, ToSchema)]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_parents: i64,
    pub total_classes: i64,
    /// Applications not yet accepted or rejected
    pub pending_admissions: i64,
    pub outstanding_fees_cents: i64,
    /// Attendance rate across today's sessions, 0 when none were taken
    pub today_attendance_rate: f64,
}
