use anyhow::Context;
use campusly_config::LibraryConfig;
use campusly_core::{AppError, Paginated, PaginationMeta};
use campusly_models::users::like_pattern;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    Book, BookFilterParams, CreateBookDto, CreateLoanDto, LOAN_SELECT, Loan, LoanFilterParams,
    UpdateBookDto, overdue_fine,
};

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

pub struct LibraryService;

impl LibraryService {
    #[instrument(skip(db, dto), fields(isbn = %dto.isbn))]
    pub async fn create_book(db: &PgPool, dto: CreateBookDto) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO library_books (title, author, isbn, category, total_copies, available_copies)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING *",
        )
        .bind(dto.title.trim())
        .bind(dto.author.trim())
        .bind(dto.isbn.trim())
        .bind(&dto.category)
        .bind(dto.total_copies)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_ISBN))?;

        info!(book_id = %book.id, "Book added to catalogue");
        Ok(book)
    }

    #[instrument(skip(db))]
    pub async fn list_books(
        db: &PgPool,
        filters: BookFilterParams,
    ) -> Result<Paginated<Book>, AppError> {
        let search = like_pattern(filters.search.as_deref());

        const WHERE: &str = "WHERE ($1::text IS NULL OR title ILIKE $1
              OR author ILIKE $1 OR isbn ILIKE $1)";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM library_books {}", WHERE))
                .bind(&search)
                .fetch_one(db)
                .await
                .context("Failed to count books")
                .map_err(AppError::database)?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM library_books {} ORDER BY title LIMIT $2 OFFSET $3",
            WHERE
        ))
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch books")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            books,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn get_book(db: &PgPool, id: Uuid) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>("SELECT * FROM library_books WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch book")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))
    }

    async fn lock_book(conn: &mut PgConnection, id: Uuid) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>("SELECT * FROM library_books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to lock book")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))
    }

    /// Changing `total_copies` shifts `available_copies` by the same amount.
    #[instrument(skip(db, dto))]
    pub async fn update_book(db: &PgPool, id: Uuid, dto: UpdateBookDto) -> Result<Book, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let existing = Self::lock_book(&mut tx, id).await?;
        let on_loan = existing.copies_on_loan();
        let total_copies = dto.total_copies.unwrap_or(existing.total_copies);
        if total_copies < on_loan {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Total copies cannot be below the {} copies currently on loan",
                on_loan
            )));
        }

        let book = sqlx::query_as::<_, Book>(
            "UPDATE library_books
             SET title = $1, author = $2, isbn = $3, category = $4,
                 total_copies = $5, available_copies = $6, updated_at = NOW()
             WHERE id = $7
             RETURNING *",
        )
        .bind(dto.title.as_deref().map(str::trim).unwrap_or(&existing.title))
        .bind(dto.author.as_deref().map(str::trim).unwrap_or(&existing.author))
        .bind(dto.isbn.as_deref().map(str::trim).unwrap_or(&existing.isbn))
        .bind(dto.category.or(existing.category))
        .bind(total_copies)
        .bind(total_copies - on_loan)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_ISBN))?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Ok(book)
    }

    #[instrument(skip(db))]
    pub async fn delete_book(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        Self::get_book(db, id).await?;

        let on_loan = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM library_loans WHERE book_id = $1 AND returned_at IS NULL)",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to check active loans")
        .map_err(AppError::database)?;

        if on_loan {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete a book with copies on loan"
            )));
        }

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        sqlx::query("DELETE FROM library_loans WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete loan history")
            .map_err(AppError::database)?;

        sqlx::query("DELETE FROM library_books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete book")
            .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(book_id = %id, "Book removed from catalogue");
        Ok(())
    }

    async fn get_loan(db: &PgPool, id: Uuid) -> Result<Loan, AppError> {
        sqlx::query_as::<_, Loan>(&format!("{} WHERE l.id = $1", LOAN_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch loan")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Loan not found")))
    }

    #[instrument(skip(db, config, dto), fields(book_id = %dto.book_id, borrower_id = %dto.borrower_id))]
    pub async fn issue_loan(
        db: &PgPool,
        config: &LibraryConfig,
        issued_by: Uuid,
        dto: CreateLoanDto,
    ) -> Result<Loan, AppError> {
        if dto.due_date < Utc::now().date_naive() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Due date cannot be in the past"
            )));
        }

        let borrower_active =
            sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
                .bind(dto.borrower_id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch borrower")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Borrower not found")))?;
        if !borrower_active {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Borrower account is deactivated"
            )));
        }

        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let book = Self::lock_book(&mut tx, dto.book_id).await?;
        if book.available_copies <= 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "No copies of this book are available"
            )));
        }

        let active_loans = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM library_loans WHERE borrower_id = $1 AND returned_at IS NULL",
        )
        .bind(dto.borrower_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count active loans")
        .map_err(AppError::database)?;

        if active_loans >= config.max_active_loans {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Borrower already has the maximum of {} active loans",
                config.max_active_loans
            )));
        }

        let loan_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO library_loans (book_id, borrower_id, issued_by, due_date)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(dto.book_id)
        .bind(dto.borrower_id)
        .bind(issued_by)
        .bind(dto.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "Borrower already has this book on loan"))?;

        sqlx::query(
            "UPDATE library_books SET available_copies = available_copies - 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(dto.book_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update stock")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(%loan_id, "Book issued");
        Self::get_loan(db, loan_id).await
    }

    #[instrument(skip(db, config))]
    pub async fn return_loan(
        db: &PgPool,
        config: &LibraryConfig,
        loan_id: Uuid,
    ) -> Result<Loan, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let (book_id, due_date, returned_at) = sqlx::query_as::<
            _,
            (Uuid, chrono::NaiveDate, Option<chrono::DateTime<Utc>>),
        >(
            "SELECT book_id, due_date, returned_at FROM library_loans WHERE id = $1 FOR UPDATE",
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock loan")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Loan not found")))?;

        if returned_at.is_some() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Loan has already been returned"
            )));
        }

        let now = Utc::now();
        let fine_cents = overdue_fine(due_date, now.date_naive(), config.fine_per_day_cents);

        sqlx::query("UPDATE library_loans SET returned_at = $1, fine_cents = $2 WHERE id = $3")
            .bind(now)
            .bind(fine_cents)
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .context("Failed to close loan")
            .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE library_books SET available_copies = available_copies + 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update stock")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        info!(%loan_id, fine_cents, "Book returned");
        Self::get_loan(db, loan_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_loans(
        db: &PgPool,
        filters: LoanFilterParams,
    ) -> Result<Paginated<Loan>, AppError> {
        const WHERE: &str = "WHERE ($1::uuid IS NULL OR l.borrower_id = $1)
              AND ($2::bool IS NULL OR (l.returned_at IS NULL) = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM library_loans l {}",
            WHERE
        ))
        .bind(filters.borrower_id)
        .bind(filters.active)
        .fetch_one(db)
        .await
        .context("Failed to count loans")
        .map_err(AppError::database)?;

        let loans = sqlx::query_as::<_, Loan>(&format!(
            "{} {} ORDER BY l.issued_at DESC LIMIT $3 OFFSET $4",
            LOAN_SELECT, WHERE
        ))
        .bind(filters.borrower_id)
        .bind(filters.active)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch loans")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            loans,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn my_loans(db: &PgPool, borrower_id: Uuid) -> Result<Vec<Loan>, AppError> {
        sqlx::query_as::<_, Loan>(&format!(
            "{} WHERE l.borrower_id = $1 ORDER BY l.returned_at IS NOT NULL, l.issued_at DESC",
            LOAN_SELECT
        ))
        .bind(borrower_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch loans")
        .map_err(AppError::database)
    }
}
