use std::collections::HashSet;

use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::service::ClassService;
use crate::modules::subjects::service::SubjectService;

use super::model::{
    AttendanceRecord, AttendanceSession, AttendanceSummary, CreateSessionDto,
    RecordAttendanceDto, SessionFilterParams, SessionStatus, SessionWithRecords, StatusCounts,
    SummaryQuery,
};

pub struct AttendanceService;

impl AttendanceService {
    #[instrument(skip(db, dto), fields(class_id = %dto.class_id, date = %dto.session_date))]
    pub async fn create_session(
        db: &PgPool,
        created_by: Uuid,
        dto: CreateSessionDto,
    ) -> Result<AttendanceSession, AppError> {
        ClassService::get_class(db, dto.class_id).await?;

        if let Some(section_id) = dto.section_id {
            let section_class = sqlx::query_scalar::<_, Uuid>(
                "SELECT class_id FROM sections WHERE id = $1",
            )
            .bind(section_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch section")
            .map_err(AppError::database)?;
            if section_class != Some(dto.class_id) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Section does not belong to this class"
                )));
            }
        }

        if let Some(subject_id) = dto.subject_id {
            let subject = SubjectService::get_subject(db, subject_id).await?;
            if subject.class_id != dto.class_id {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Subject does not belong to this class"
                )));
            }
        }

        let session = sqlx::query_as::<_, AttendanceSession>(
            "INSERT INTO attendance_sessions (class_id, section_id, subject_id, session_date, status, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(dto.class_id)
        .bind(dto.section_id)
        .bind(dto.subject_id)
        .bind(dto.session_date)
        .bind(SessionStatus::Open.as_str())
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(|e| {
            AppError::from_write(e, "An attendance session already exists for this slot and date")
        })?;

        info!(session_id = %session.id, "Attendance session opened");
        Ok(session)
    }

    #[instrument(skip(db))]
    pub async fn list_sessions(
        db: &PgPool,
        filters: SessionFilterParams,
    ) -> Result<Paginated<AttendanceSession>, AppError> {
        const WHERE: &str = "WHERE ($1::uuid IS NULL OR class_id = $1)
              AND ($2::date IS NULL OR session_date = $2)
              AND ($3::text IS NULL OR status = $3)";
        let status = filters.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM attendance_sessions {}",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.session_date)
        .bind(status)
        .fetch_one(db)
        .await
        .context("Failed to count attendance sessions")
        .map_err(AppError::database)?;

        let sessions = sqlx::query_as::<_, AttendanceSession>(&format!(
            "SELECT * FROM attendance_sessions {} ORDER BY session_date DESC, created_at DESC
             LIMIT $4 OFFSET $5",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.session_date)
        .bind(status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance sessions")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            sessions,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    pub async fn get_session(db: &PgPool, id: Uuid) -> Result<AttendanceSession, AppError> {
        sqlx::query_as::<_, AttendanceSession>("SELECT * FROM attendance_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch attendance session")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance session not found")))
    }

    async fn lock_session(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<AttendanceSession, AppError> {
        sqlx::query_as::<_, AttendanceSession>(
            "SELECT * FROM attendance_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("Failed to lock attendance session")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance session not found")))
    }

    async fn list_records(db: &PgPool, session_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        sqlx::query_as::<_, AttendanceRecord>(
            "SELECT r.id, r.session_id, r.student_id, u.first_name, u.last_name,
                    r.status, r.note, r.recorded_by, r.updated_at
             FROM attendance_records r
             JOIN students s ON s.id = r.student_id
             JOIN users u ON u.id = s.user_id
             WHERE r.session_id = $1
             ORDER BY u.last_name, u.first_name",
        )
        .bind(session_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance records")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get_session_with_records(
        db: &PgPool,
        id: Uuid,
    ) -> Result<SessionWithRecords, AppError> {
        let session = Self::get_session(db, id).await?;
        let records = Self::list_records(db, id).await?;
        Ok(SessionWithRecords { session, records })
    }

    /// Upserts one record per student while the session is open.
    #[instrument(skip(db, dto), fields(records = dto.records.len()))]
    pub async fn record_attendance(
        db: &PgPool,
        recorded_by: Uuid,
        session_id: Uuid,
        dto: RecordAttendanceDto,
    ) -> Result<SessionWithRecords, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let session = Self::lock_session(&mut tx, session_id).await?;
        if !session.is_open() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Attendance session is closed"
            )));
        }

        let student_ids: Vec<Uuid> = dto.records.iter().map(|r| r.student_id).collect();
        let eligible = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM students
             WHERE class_id = $1
               AND ($2::uuid IS NULL OR section_id = $2)
               AND id = ANY($3)",
        )
        .bind(session.class_id)
        .bind(session.section_id)
        .bind(&student_ids)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to check enrollment")
        .map_err(AppError::database)?;

        let eligible: HashSet<Uuid> = eligible.into_iter().collect();
        if let Some(outsider) = student_ids.iter().find(|id| !eligible.contains(id)) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Student {} does not belong to this session's class",
                outsider
            )));
        }

        for record in &dto.records {
            sqlx::query(
                "INSERT INTO attendance_records (session_id, student_id, status, note, recorded_by)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (session_id, student_id) DO UPDATE
                 SET status = EXCLUDED.status,
                     note = EXCLUDED.note,
                     recorded_by = EXCLUDED.recorded_by,
                     updated_at = NOW()",
            )
            .bind(session_id)
            .bind(record.student_id)
            .bind(record.status.as_str())
            .bind(&record.note)
            .bind(recorded_by)
            .execute(&mut *tx)
            .await
            .context("Failed to save attendance record")
            .map_err(AppError::database)?;
        }

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Self::get_session_with_records(db, session_id).await
    }

    async fn transition(
        db: &PgPool,
        id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<AttendanceSession, AppError> {
        let session = Self::get_session(db, id).await?;
        if session.status != from.as_str() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Attendance session is already {}",
                session.status
            )));
        }

        let closed_at = if to == SessionStatus::Closed {
            Some(chrono::Utc::now())
        } else {
            None
        };

        sqlx::query_as::<_, AttendanceSession>(
            "UPDATE attendance_sessions SET status = $1, closed_at = $2, updated_at = NOW()
             WHERE id = $3 AND status = $4
             RETURNING *",
        )
        .bind(to.as_str())
        .bind(closed_at)
        .bind(id)
        .bind(from.as_str())
        .fetch_optional(db)
        .await
        .context("Failed to update attendance session")
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::conflict(anyhow::anyhow!("Attendance session changed concurrently"))
        })
    }

    #[instrument(skip(db))]
    pub async fn close_session(db: &PgPool, id: Uuid) -> Result<AttendanceSession, AppError> {
        let session = Self::transition(db, id, SessionStatus::Open, SessionStatus::Closed).await?;
        info!(session_id = %id, "Attendance session closed");
        Ok(session)
    }

    #[instrument(skip(db))]
    pub async fn reopen_session(db: &PgPool, id: Uuid) -> Result<AttendanceSession, AppError> {
        let session = Self::transition(db, id, SessionStatus::Closed, SessionStatus::Open).await?;
        info!(session_id = %id, "Attendance session reopened");
        Ok(session)
    }

    #[instrument(skip(db))]
    pub async fn student_summary(
        db: &PgPool,
        student_id: Uuid,
        query: SummaryQuery,
    ) -> Result<AttendanceSummary, AppError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "from must not be after to"
                )));
            }
        }

        let counts = sqlx::query_as::<_, StatusCounts>(
            "SELECT
                COUNT(*) FILTER (WHERE r.status = 'present') AS present,
                COUNT(*) FILTER (WHERE r.status = 'absent') AS absent,
                COUNT(*) FILTER (WHERE r.status = 'late') AS late,
                COUNT(*) FILTER (WHERE r.status = 'excused') AS excused
             FROM attendance_records r
             JOIN attendance_sessions s ON s.id = r.session_id
             WHERE r.student_id = $1
               AND ($2::date IS NULL OR s.session_date >= $2)
               AND ($3::date IS NULL OR s.session_date <= $3)",
        )
        .bind(student_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(db)
        .await
        .context("Failed to summarize attendance")
        .map_err(AppError::database)?;

        Ok(AttendanceSummary::new(student_id, &query, counts))
    }
}
