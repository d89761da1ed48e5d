use anyhow::Context;
use campusly_core::{AppError, Paginated, PaginationMeta};
use campusly_observability::track_payment_recorded;
use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::students::service::StudentService;

use super::model::{
    CreateInvoiceDto, Invoice, InvoiceFilterParams, InvoiceStatus, InvoiceView, Payment,
    PaymentReceipt, RecordPaymentDto,
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn invoice_status(invoice: &Invoice) -> Result<InvoiceStatus, AppError> {
    invoice
        .status
        .parse()
        .map_err(|e: String| AppError::internal_error(e))
}

pub struct FeeService;

impl FeeService {
    #[instrument(skip(db, dto), fields(student_id = %dto.student_id))]
    pub async fn create_invoice(
        db: &PgPool,
        created_by: Uuid,
        dto: CreateInvoiceDto,
    ) -> Result<InvoiceView, AppError> {
        StudentService::get_student(db, dto.student_id).await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            "INSERT INTO fee_invoices (student_id, title, description, amount_cents, status, due_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(dto.student_id)
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.amount_cents)
        .bind(InvoiceStatus::Unpaid.as_str())
        .bind(dto.due_date)
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, "Invoice already exists"))?;

        info!(invoice_id = %invoice.id, amount_cents = invoice.amount_cents, "Invoice created");
        Ok(InvoiceView::new(invoice, today()))
    }

    #[instrument(skip(db))]
    pub async fn list_invoices(
        db: &PgPool,
        filters: InvoiceFilterParams,
    ) -> Result<Paginated<InvoiceView>, AppError> {
        const WHERE: &str = "WHERE ($1::uuid IS NULL OR student_id = $1)
              AND ($2::text IS NULL OR status = $2)";
        let status = filters.status.map(|s| s.as_str());

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM fee_invoices {}", WHERE))
                .bind(filters.student_id)
                .bind(status)
                .fetch_one(db)
                .await
                .context("Failed to count invoices")
                .map_err(AppError::database)?;

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT * FROM fee_invoices {} ORDER BY due_date DESC, created_at DESC
             LIMIT $3 OFFSET $4",
            WHERE
        ))
        .bind(filters.student_id)
        .bind(status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch invoices")
        .map_err(AppError::database)?;

        let today = today();
        Ok(Paginated::new(
            invoices
                .into_iter()
                .map(|i| InvoiceView::new(i, today))
                .collect(),
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    async fn fetch_invoice(db: &PgPool, id: Uuid) -> Result<Invoice, AppError> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM fee_invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch invoice")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invoice not found")))
    }

    async fn lock_invoice(conn: &mut PgConnection, id: Uuid) -> Result<Invoice, AppError> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM fee_invoices WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to lock invoice")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invoice not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_invoice(db: &PgPool, id: Uuid) -> Result<InvoiceView, AppError> {
        let invoice = Self::fetch_invoice(db, id).await?;
        Ok(InvoiceView::new(invoice, today()))
    }

    /// Records a payment and recomputes the invoice status from the running
    /// total, with the invoice row locked for the duration.
    #[instrument(skip(db, dto), fields(amount_cents = dto.amount_cents, method = dto.method.as_str()))]
    pub async fn record_payment(
        db: &PgPool,
        received_by: Uuid,
        invoice_id: Uuid,
        dto: RecordPaymentDto,
    ) -> Result<PaymentReceipt, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let invoice = Self::lock_invoice(&mut tx, invoice_id).await?;
        let status = invoice_status(&invoice)?;
        if !status.accepts_payments() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Invoice is {} and cannot accept payments",
                status
            )));
        }

        let outstanding = invoice.amount_cents - invoice.paid_cents;
        if dto.amount_cents > outstanding {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Payment of {} exceeds the outstanding balance of {}",
                dto.amount_cents,
                outstanding
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO fee_payments (invoice_id, amount_cents, method, reference, received_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(invoice_id)
        .bind(dto.amount_cents)
        .bind(dto.method.as_str())
        .bind(&dto.reference)
        .bind(received_by)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert payment")
        .map_err(AppError::database)?;

        let paid_cents = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM fee_payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to total payments")
        .map_err(AppError::database)?;

        let next = InvoiceStatus::from_amounts(invoice.amount_cents, paid_cents);
        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE fee_invoices SET paid_cents = $1, status = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING *",
        )
        .bind(paid_cents)
        .bind(next.as_str())
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update invoice")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        track_payment_recorded(dto.method.as_str(), dto.amount_cents);
        info!(%invoice_id, payment_id = %payment.id, status = %next, "Payment recorded");

        Ok(PaymentReceipt {
            payment,
            invoice: InvoiceView::new(invoice, today()),
        })
    }

    #[instrument(skip(db))]
    pub async fn list_payments(db: &PgPool, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        Self::fetch_invoice(db, invoice_id).await?;

        sqlx::query_as::<_, Payment>(
            "SELECT * FROM fee_payments WHERE invoice_id = $1 ORDER BY paid_at",
        )
        .bind(invoice_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch payments")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn cancel_invoice(db: &PgPool, id: Uuid) -> Result<InvoiceView, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let invoice = Self::lock_invoice(&mut tx, id).await?;
        let status = invoice_status(&invoice)?;
        if status == InvoiceStatus::Cancelled {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Invoice is already cancelled"
            )));
        }

        let has_payments = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM fee_payments WHERE invoice_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to check payments")
        .map_err(AppError::database)?;

        if has_payments {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Invoices with payments cannot be cancelled"
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE fee_invoices SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(InvoiceStatus::Cancelled.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to cancel invoice")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(invoice_id = %id, "Invoice cancelled");
        Ok(InvoiceView::new(invoice, today()))
    }

    #[instrument(skip(db))]
    pub async fn student_invoices(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<InvoiceView>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM fee_invoices WHERE student_id = $1 ORDER BY due_date DESC",
        )
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student invoices")
        .map_err(AppError::database)?;

        let today = today();
        Ok(invoices
            .into_iter()
            .map(|i| InvoiceView::new(i, today))
            .collect())
    }
}
