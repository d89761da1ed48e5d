use std::collections::HashSet;

use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::subjects::service::SubjectService;

use super::model::{
    CreateExamDto, EnterMarksDto, Exam, ExamFilterParams, ExamMark, ExamStatus, ResultRow,
    StudentResult, UpdateExamDto,
};

pub struct ExamService;

impl ExamService {
    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_exam(
        db: &PgPool,
        created_by: Uuid,
        dto: CreateExamDto,
    ) -> Result<Exam, AppError> {
        let subject = SubjectService::get_subject(db, dto.subject_id).await?;
        if subject.class_id != dto.class_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Subject does not belong to this class"
            )));
        }

        let exam = sqlx::query_as::<_, Exam>(
            "INSERT INTO exams (name, class_id, subject_id, exam_date, max_marks, pass_marks, status, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(dto.name.trim())
        .bind(dto.class_id)
        .bind(dto.subject_id)
        .bind(dto.exam_date)
        .bind(dto.max_marks)
        .bind(dto.pass_marks)
        .bind(ExamStatus::Draft.as_str())
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Exam already exists"))?;

        info!(exam_id = %exam.id, "Exam created");
        Ok(exam)
    }

    #[instrument(skip(db))]
    pub async fn list_exams(
        db: &PgPool,
        filters: ExamFilterParams,
    ) -> Result<Paginated<Exam>, AppError> {
        const WHERE: &str = "WHERE ($1::uuid IS NULL OR class_id = $1)
              AND ($2::uuid IS NULL OR subject_id = $2)
              AND ($3::text IS NULL OR status = $3)";
        let status = filters.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM exams {}", WHERE))
            .bind(filters.class_id)
            .bind(filters.subject_id)
            .bind(status)
            .fetch_one(db)
            .await
            .context("Failed to count exams")
            .map_err(AppError::database)?;

        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT * FROM exams {} ORDER BY exam_date DESC, name LIMIT $4 OFFSET $5",
            WHERE
        ))
        .bind(filters.class_id)
        .bind(filters.subject_id)
        .bind(status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch exams")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            exams,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_exam(db: &PgPool, id: Uuid) -> Result<Exam, AppError> {
        sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch exam")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))
    }

    async fn lock_exam(conn: &mut PgConnection, id: Uuid) -> Result<Exam, AppError> {
        sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to lock exam")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))
    }

    fn ensure_draft(exam: &Exam) -> Result<(), AppError> {
        if exam.is_draft() {
            Ok(())
        } else {
            Err(AppError::bad_request(anyhow::anyhow!(
                "Exam is published and can no longer be changed"
            )))
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn update_exam(db: &PgPool, id: Uuid, dto: UpdateExamDto) -> Result<Exam, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let existing = Self::lock_exam(&mut tx, id).await?;
        Self::ensure_draft(&existing)?;

        let max_marks = dto.max_marks.unwrap_or(existing.max_marks);
        let pass_marks = dto.pass_marks.unwrap_or(existing.pass_marks);
        if pass_marks > max_marks {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "pass_marks cannot exceed max_marks"
            )));
        }

        if max_marks < existing.max_marks {
            let highest = sqlx::query_scalar::<_, Option<i32>>(
                "SELECT MAX(marks_obtained) FROM exam_marks WHERE exam_id = $1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check entered marks")
            .map_err(AppError::database)?;

            if let Some(highest) = highest.filter(|&m| m > max_marks) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "max_marks cannot be lower than an entered mark ({})",
                    highest
                )));
            }
        }

        let exam = sqlx::query_as::<_, Exam>(
            "UPDATE exams
             SET name = $1, exam_date = $2, max_marks = $3, pass_marks = $4, updated_at = NOW()
             WHERE id = $5
             RETURNING *",
        )
        .bind(dto.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(dto.exam_date.unwrap_or(existing.exam_date))
        .bind(max_marks)
        .bind(pass_marks)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update exam")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit exam update")
            .map_err(AppError::database)?;

        info!(exam_id = %id, "Exam updated");
        Ok(exam)
    }

    #[instrument(skip(db))]
    pub async fn delete_exam(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let exam = Self::get_exam(db, id).await?;
        Self::ensure_draft(&exam)?;

        sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete exam")
            .map_err(AppError::database)?;

        info!(exam_id = %id, "Exam deleted");
        Ok(())
    }

    /// Admins and the teacher assigned to the exam's subject may enter marks.
    async fn ensure_can_enter_marks(
        db: &PgPool,
        auth_user: &AuthUser,
        exam: &Exam,
    ) -> Result<(), AppError> {
        if auth_user.is_admin() {
            return Ok(());
        }
        let subject = SubjectService::get_subject(db, exam.subject_id).await?;
        if subject.teacher_id == Some(auth_user.user_id()?) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the subject teacher or an admin can enter marks".to_string(),
            ))
        }
    }

    /// Upserts the whole batch or nothing.
    #[instrument(skip(db, auth_user, dto), fields(entries = dto.entries.len()))]
    pub async fn enter_marks(
        db: &PgPool,
        auth_user: &AuthUser,
        exam_id: Uuid,
        dto: EnterMarksDto,
    ) -> Result<Vec<ExamMark>, AppError> {
        let exam = Self::get_exam(db, exam_id).await?;
        Self::ensure_can_enter_marks(db, auth_user, &exam).await?;
        let entered_by = auth_user.user_id()?;

        let mut seen = HashSet::with_capacity(dto.entries.len());
        for entry in &dto.entries {
            if !seen.insert(entry.student_id) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Student {} appears more than once",
                    entry.student_id
                )));
            }
            if entry.marks_obtained > exam.max_marks {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Marks for student {} exceed the maximum of {}",
                    entry.student_id,
                    exam.max_marks
                )));
            }
        }

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let exam = Self::lock_exam(&mut tx, exam_id).await?;
        Self::ensure_draft(&exam)?;

        let student_ids: Vec<Uuid> = dto.entries.iter().map(|e| e.student_id).collect();
        let enrolled = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM students WHERE class_id = $1 AND id = ANY($2)",
        )
        .bind(exam.class_id)
        .bind(&student_ids)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to check enrollment")
        .map_err(AppError::database)?;

        let enrolled: HashSet<Uuid> = enrolled.into_iter().collect();
        if let Some(missing) = student_ids.iter().find(|id| !enrolled.contains(id)) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Student {} is not enrolled in the exam's class",
                missing
            )));
        }

        for entry in &dto.entries {
            sqlx::query(
                "INSERT INTO exam_marks (exam_id, student_id, marks_obtained, remarks, entered_by)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (exam_id, student_id) DO UPDATE
                 SET marks_obtained = EXCLUDED.marks_obtained,
                     remarks = EXCLUDED.remarks,
                     entered_by = EXCLUDED.entered_by,
                     updated_at = NOW()",
            )
            .bind(exam_id)
            .bind(entry.student_id)
            .bind(entry.marks_obtained)
            .bind(&entry.remarks)
            .bind(entered_by)
            .execute(&mut *tx)
            .await
            .context("Failed to save marks")
            .map_err(AppError::database)?;
        }

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(%exam_id, count = dto.entries.len(), "Marks saved");
        Self::list_marks(db, exam_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_marks(db: &PgPool, exam_id: Uuid) -> Result<Vec<ExamMark>, AppError> {
        sqlx::query_as::<_, ExamMark>(
            "SELECT m.id, m.exam_id, m.student_id, u.first_name, u.last_name,
                    s.admission_number, m.marks_obtained, m.remarks, m.entered_by, m.updated_at
             FROM exam_marks m
             JOIN students s ON s.id = m.student_id
             JOIN users u ON u.id = s.user_id
             WHERE m.exam_id = $1
             ORDER BY u.last_name, u.first_name",
        )
        .bind(exam_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch marks")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn publish_exam(db: &PgPool, id: Uuid) -> Result<Exam, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let exam = Self::lock_exam(&mut tx, id).await?;
        Self::ensure_draft(&exam)?;

        let exam = sqlx::query_as::<_, Exam>(
            "UPDATE exams SET status = $1, published_at = NOW(), updated_at = NOW()
             WHERE id = $2
             RETURNING *",
        )
        .bind(ExamStatus::Published.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to publish exam")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(exam_id = %id, "Exam published");
        Ok(exam)
    }

    /// Graded results of published exams for one student.
    #[instrument(skip(db))]
    pub async fn student_results(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<StudentResult>, AppError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            "SELECT e.id AS exam_id, e.name AS exam_name, e.subject_id, sub.name AS subject_name,
                    e.exam_date, e.max_marks, e.pass_marks, m.marks_obtained, m.remarks
             FROM exam_marks m
             JOIN exams e ON e.id = m.exam_id
             JOIN subjects sub ON sub.id = e.subject_id
             WHERE m.student_id = $1 AND e.status = $2
             ORDER BY e.exam_date DESC, sub.name",
        )
        .bind(student_id)
        .bind(ExamStatus::Published.as_str())
        .fetch_all(db)
        .await
        .context("Failed to fetch results")
        .map_err(AppError::database)?;

        Ok(rows.into_iter().map(StudentResult::from).collect())
    }
}
