use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta, hash_password};
use campusly_observability::{track_admission_decision, track_user_created};
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::students::service::{NewStudentProfile, StudentService};
use crate::modules::users::model::UserRole;
use crate::modules::users::service::{NewUser, UserService};
use crate::utils::email::EmailService;

use super::model::{
    AcceptAdmissionDto, AcceptedAdmission, Admission, AdmissionFilterParams, AdmissionStatus,
    CreateAdmissionDto, RecordAssessmentDto, RejectAdmissionDto, ScheduleAssessmentDto,
};

fn admission_status(admission: &Admission) -> Result<AdmissionStatus, AppError> {
    admission
        .status
        .parse()
        .map_err(|e: String| AppError::internal_error(e))
}

fn advance(admission: &Admission, next: AdmissionStatus) -> Result<AdmissionStatus, AppError> {
    admission_status(admission)?
        .transition(next)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!(e)))
}

fn applicant_name(admission: &Admission) -> String {
    format!(
        "{} {}",
        admission.applicant_first_name, admission.applicant_last_name
    )
}

pub struct AdmissionService;

impl AdmissionService {
    #[instrument(skip(db, dto), fields(guardian_email = %dto.guardian_email))]
    pub async fn create_application(
        db: &PgPool,
        dto: CreateAdmissionDto,
    ) -> Result<Admission, AppError> {
        if dto.date_of_birth >= Utc::now().date_naive() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "date_of_birth must be in the past"
            )));
        }

        let admission = sqlx::query_as::<_, Admission>(
            "INSERT INTO admissions
                (applicant_first_name, applicant_last_name, date_of_birth, gender,
                 guardian_name, guardian_email, guardian_phone, desired_class_id, previous_school)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(dto.applicant_first_name.trim())
        .bind(dto.applicant_last_name.trim())
        .bind(dto.date_of_birth)
        .bind(&dto.gender)
        .bind(dto.guardian_name.trim())
        .bind(dto.guardian_email.trim().to_lowercase())
        .bind(dto.guardian_phone.trim())
        .bind(dto.desired_class_id)
        .bind(&dto.previous_school)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Application already exists"))?;

        info!(admission_id = %admission.id, "Admission application submitted");
        Ok(admission)
    }

    #[instrument(skip(db))]
    pub async fn list_applications(
        db: &PgPool,
        filters: AdmissionFilterParams,
    ) -> Result<Paginated<Admission>, AppError> {
        let status = filters.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admissions WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(db)
        .await
        .context("Failed to count admissions")
        .map_err(AppError::database)?;

        let admissions = sqlx::query_as::<_, Admission>(
            "SELECT * FROM admissions
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch admissions")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            admissions,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_application(db: &PgPool, id: Uuid) -> Result<Admission, AppError> {
        sqlx::query_as::<_, Admission>("SELECT * FROM admissions WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch admission")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Application not found")))
    }

    async fn lock_application(conn: &mut PgConnection, id: Uuid) -> Result<Admission, AppError> {
        sqlx::query_as::<_, Admission>("SELECT * FROM admissions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to lock admission")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Application not found")))
    }

    #[instrument(skip(db, email, dto))]
    pub async fn schedule_assessment(
        db: &PgPool,
        email: &EmailService,
        id: Uuid,
        dto: ScheduleAssessmentDto,
    ) -> Result<Admission, AppError> {
        if dto.assessment_date < Utc::now().date_naive() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "assessment_date cannot be in the past"
            )));
        }

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let current = Self::lock_application(&mut tx, id).await?;
        let next = advance(&current, AdmissionStatus::AssessmentScheduled)?;

        let admission = sqlx::query_as::<_, Admission>(
            "UPDATE admissions SET status = $1, assessment_date = $2, updated_at = NOW()
             WHERE id = $3 RETURNING *",
        )
        .bind(next.as_str())
        .bind(dto.assessment_date)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to schedule assessment")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        email.send_admission_update(
            &admission.guardian_email,
            &admission.guardian_name,
            &applicant_name(&admission),
            "An assessment has been scheduled",
            &format!(
                "Please bring the applicant to school on {}.",
                dto.assessment_date
            ),
        );

        info!(admission_id = %id, "Assessment scheduled");
        Ok(admission)
    }

    #[instrument(skip(db, dto))]
    pub async fn record_assessment(
        db: &PgPool,
        id: Uuid,
        dto: RecordAssessmentDto,
    ) -> Result<Admission, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let current = Self::lock_application(&mut tx, id).await?;
        let next = advance(&current, AdmissionStatus::Assessed)?;

        let admission = sqlx::query_as::<_, Admission>(
            "UPDATE admissions
             SET status = $1, assessment_score = $2, assessment_notes = $3, updated_at = NOW()
             WHERE id = $4 RETURNING *",
        )
        .bind(next.as_str())
        .bind(dto.score)
        .bind(&dto.notes)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to record assessment")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(admission_id = %id, score = dto.score, "Assessment recorded");
        Ok(admission)
    }

    /// Accepts an assessed application, creating the student account and
    /// profile in the same transaction.
    #[instrument(skip(db, email, dto))]
    pub async fn accept(
        db: &PgPool,
        email: &EmailService,
        id: Uuid,
        dto: AcceptAdmissionDto,
    ) -> Result<AcceptedAdmission, AppError> {
        let password_hash = hash_password(&dto.password)?;

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let current = Self::lock_application(&mut tx, id).await?;
        let next = advance(&current, AdmissionStatus::Accepted)?;

        let user = UserService::insert_user(
            &mut *tx,
            NewUser {
                first_name: &current.applicant_first_name,
                last_name: &current.applicant_last_name,
                email: &dto.email,
                phone: None,
                password_hash: &password_hash,
                role: UserRole::Student,
                is_verified: true,
            },
        )
        .await?;

        let class_id = dto.class_id.or(current.desired_class_id);
        let student_id = StudentService::insert_profile(
            &mut tx,
            NewStudentProfile {
                user_id: user.id,
                admission_number: &dto.admission_number,
                date_of_birth: Some(current.date_of_birth),
                gender: current.gender.as_deref(),
                address: None,
                class_id,
                section_id: dto.section_id,
            },
        )
        .await?;

        let admission = sqlx::query_as::<_, Admission>(
            "UPDATE admissions
             SET status = $1, student_id = $2, decided_at = NOW(), updated_at = NOW()
             WHERE id = $3 RETURNING *",
        )
        .bind(next.as_str())
        .bind(student_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to accept admission")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_user_created(UserRole::Student.as_str());
        track_admission_decision(next.as_str());
        email.send_admission_update(
            &admission.guardian_email,
            &admission.guardian_name,
            &applicant_name(&admission),
            "The application has been accepted",
            &format!(
                "Admission number {}. The student can sign in as {}.",
                dto.admission_number.trim(),
                user.email
            ),
        );

        info!(admission_id = %id, %student_id, "Admission accepted");
        let student = StudentService::get_student(db, student_id).await?;
        Ok(AcceptedAdmission { admission, student })
    }

    #[instrument(skip(db, email, dto))]
    pub async fn reject(
        db: &PgPool,
        email: &EmailService,
        id: Uuid,
        dto: RejectAdmissionDto,
    ) -> Result<Admission, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let current = Self::lock_application(&mut tx, id).await?;
        let next = advance(&current, AdmissionStatus::Rejected)?;

        let admission = sqlx::query_as::<_, Admission>(
            "UPDATE admissions
             SET status = $1, rejection_reason = $2, decided_at = NOW(), updated_at = NOW()
             WHERE id = $3 RETURNING *",
        )
        .bind(next.as_str())
        .bind(dto.reason.trim())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reject admission")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_admission_decision(next.as_str());
        email.send_admission_update(
            &admission.guardian_email,
            &admission.guardian_name,
            &applicant_name(&admission),
            "The application was not successful",
            dto.reason.trim(),
        );

        info!(admission_id = %id, "Admission rejected");
        Ok(admission)
    }
}
