use anyhow::Context;
use campusly_core::AppError;
use campusly_models::attendance::attendance_rate;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use super::model::DashboardStats;

#[derive(FromRow)]
struct Counts {
    total_students: i64,
    total_teachers: i64,
    total_parents: i64,
    total_classes: i64,
    pending_admissions: i64,
    outstanding_fees_cents: i64,
}

#[derive(FromRow)]
struct TodayAttendance {
    present: i64,
    late: i64,
    total: i64,
}

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db))]
    pub async fn stats(db: &PgPool) -> Result<DashboardStats, AppError> {
        let counts = sqlx::query_as::<_, Counts>(
            "SELECT
                (SELECT COUNT(*) FROM students) AS total_students,
                (SELECT COUNT(*) FROM teachers) AS total_teachers,
                (SELECT COUNT(*) FROM parents) AS total_parents,
                (SELECT COUNT(*) FROM classes) AS total_classes,
                (SELECT COUNT(*) FROM admissions
                  WHERE status NOT IN ('accepted', 'rejected')) AS pending_admissions,
                (SELECT COALESCE(SUM(amount_cents - paid_cents), 0)::BIGINT FROM fee_invoices
                  WHERE status IN ('unpaid', 'partially_paid')) AS outstanding_fees_cents",
        )
        .fetch_one(db)
        .await
        .context("Failed to load dashboard counts")
        .map_err(AppError::database)?;

        let today = sqlx::query_as::<_, TodayAttendance>(
            "SELECT
                COUNT(*) FILTER (WHERE r.status = 'present') AS present,
                COUNT(*) FILTER (WHERE r.status = 'late') AS late,
                COUNT(*) AS total
             FROM attendance_records r
             JOIN attendance_sessions s ON s.id = r.session_id
             WHERE s.session_date = CURRENT_DATE",
        )
        .fetch_one(db)
        .await
        .context("Failed to load today's attendance")
        .map_err(AppError::database)?;

        Ok(DashboardStats {
            total_students: counts.total_students,
            total_teachers: counts.total_teachers,
            total_parents: counts.total_parents,
            total_classes: counts.total_classes,
            pending_admissions: counts.pending_admissions,
            outstanding_fees_cents: counts.outstanding_fees_cents,
            today_attendance_rate: attendance_rate(today.present, today.late, today.total),
        })
    }
}
