use anyhow::Context;
use campusly_core::{AppError, PaginationParams, Paginated, PaginationMeta};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::model::{InboxFilterParams, MESSAGE_COLUMNS, Message, SendMessageDto, UnreadCount};

fn not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Message not found"))
}

pub struct MessageService;

impl MessageService {
    #[instrument(skip(db, dto), fields(recipient_id = %dto.recipient_id))]
    pub async fn send(db: &PgPool, sender_id: Uuid, dto: SendMessageDto) -> Result<Message, AppError> {
        if dto.recipient_id == sender_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot send a message to yourself"
            )));
        }

        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
            .bind(dto.recipient_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch recipient")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Recipient not found")))?;

        if !active {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Recipient account is deactivated"
            )));
        }

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (sender_id, recipient_id, subject, body)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(sender_id)
        .bind(dto.recipient_id)
        .bind(&dto.subject)
        .bind(&dto.body)
        .fetch_one(db)
        .await
        .context("Failed to send message")
        .map_err(AppError::database)?;

        debug!(message_id = %message.id, "Message sent");
        Ok(message)
    }

    #[instrument(skip(db))]
    pub async fn inbox(
        db: &PgPool,
        user_id: Uuid,
        filters: InboxFilterParams,
    ) -> Result<Paginated<Message>, AppError> {
        const WHERE: &str = "WHERE recipient_id = $1 AND NOT recipient_deleted
              AND ($2::bool IS NULL OR (read_at IS NULL) = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM messages {}", WHERE))
            .bind(user_id)
            .bind(filters.unread)
            .fetch_one(db)
            .await
            .context("Failed to count inbox")
            .map_err(AppError::database)?;

        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages {} ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            MESSAGE_COLUMNS, WHERE
        ))
        .bind(user_id)
        .bind(filters.unread)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch inbox")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            messages,
            PaginationMeta::from_params(total, &filters.pagination),
        ))
    }

    #[instrument(skip(db))]
    pub async fn sent(
        db: &PgPool,
        user_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<Paginated<Message>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE sender_id = $1 AND NOT sender_deleted",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to count sent messages")
        .map_err(AppError::database)?;

        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE sender_id = $1 AND NOT sender_deleted
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            MESSAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch sent messages")
        .map_err(AppError::database)?;

        Ok(Paginated::new(
            messages,
            PaginationMeta::from_params(total, &pagination),
        ))
    }

    /// Fetches a message the caller can still see; reading as the recipient
    /// marks it read.
    #[instrument(skip(db))]
    pub async fn get_message(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages
             WHERE id = $1
               AND ((sender_id = $2 AND NOT sender_deleted)
                 OR (recipient_id = $2 AND NOT recipient_deleted))",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch message")
        .map_err(AppError::database)?
        .ok_or_else(not_found)?;

        if message.recipient_id == user_id && message.read_at.is_none() {
            return Self::mark_read(db, user_id, id).await;
        }
        Ok(message)
    }

    #[instrument(skip(db))]
    pub async fn mark_read(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND recipient_id = $2 AND NOT recipient_deleted
             RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to mark message read")
        .map_err(AppError::database)?
        .ok_or_else(not_found)
    }

    /// Hides the message from the caller's side; the row goes once both
    /// sides have deleted it.
    #[instrument(skip(db))]
    pub async fn delete_message(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let result = sqlx::query(
            "UPDATE messages
             SET sender_deleted = sender_deleted OR sender_id = $2,
                 recipient_deleted = recipient_deleted OR recipient_id = $2
             WHERE id = $1
               AND ((sender_id = $2 AND NOT sender_deleted)
                 OR (recipient_id = $2 AND NOT recipient_deleted))",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete message")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        sqlx::query("DELETE FROM messages WHERE id = $1 AND sender_deleted AND recipient_deleted")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to purge message")
            .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &PgPool, user_id: Uuid) -> Result<UnreadCount, AppError> {
        let unread = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages
             WHERE recipient_id = $1 AND read_at IS NULL AND NOT recipient_deleted",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to count unread messages")
        .map_err(AppError::database)?;

        Ok(UnreadCount { unread })
    }
}
