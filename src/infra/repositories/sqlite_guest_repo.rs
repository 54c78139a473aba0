use crate::domain::{
    models::guest::{Guest, GuestDetails, RsvpUpdate},
    ports::GuestRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqlitePool};

use super::BATCH_CHUNK_SIZE;

const GUEST_COLUMNS: &str = "id, event_id, email, name, unique_token, rsvp_status, invitation_sent, attended, feedback_sent, barcode_data, other_details, created_at";

pub struct SqliteGuestRepo {
    pool: SqlitePool,
}

impl SqliteGuestRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Runs `statement` (ending in `id IN (`) over the ids as bound parameters,
    /// chunked inside one transaction so the batch lands all-or-nothing.
    async fn update_ids(&self, statement: &'static str, guest_ids: &[String]) -> Result<u64, AppError> {
        if guest_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut affected = 0;

        for chunk in guest_ids.chunks(BATCH_CHUNK_SIZE) {
            let mut builder = QueryBuilder::<Sqlite>::new(statement);
            let mut ids = builder.separated(", ");
            for id in chunk {
                ids.push_bind(id);
            }
            ids.push_unseparated(")");

            let result = builder.build()
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            affected += result.rows_affected();
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(affected)
    }
}

#[async_trait]
impl GuestRepository for SqliteGuestRepo {
    async fn create_many(&self, guests: &[Guest]) -> Result<u64, AppError> {
        if guests.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut inserted = 0;

        for chunk in guests.chunks(BATCH_CHUNK_SIZE) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO guests (id, event_id, email, unique_token, rsvp_status, other_details, created_at) ",
            );
            builder.push_values(chunk, |mut row, guest| {
                row.push_bind(&guest.id)
                    .push_bind(&guest.event_id)
                    .push_bind(&guest.email)
                    .push_bind(&guest.unique_token)
                    .push_bind(guest.rsvp_status.as_str())
                    .push_bind(&guest.other_details)
                    .push_bind(guest.created_at);
            });
            builder.push(" ON CONFLICT (event_id, email) DO NOTHING");

            let result = builder.build()
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(inserted)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE event_id = ? ORDER BY created_at, email"
        ))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<GuestDetails>, AppError> {
        sqlx::query_as::<_, GuestDetails>(
            "SELECT g.id, g.event_id, g.email, g.name, g.unique_token, g.rsvp_status, g.invitation_sent, g.attended, g.feedback_sent, g.barcode_data, g.other_details, g.created_at, \
             e.name AS event_name, e.description AS event_description, e.location AS event_location, e.event_date AS event_date \
             FROM guests g JOIN events e ON g.event_id = e.id WHERE g.unique_token = ?",
        )
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_attended_if_unset(&self, barcode_data: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE guests SET attended = 1 WHERE barcode_data = ? AND attended = 0 AND rsvp_status = 'CONFIRMED'",
        )
            .bind(barcode_data)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_attended_without_feedback(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE event_id = ? AND attended = 1 AND feedback_sent = 0 ORDER BY created_at, email"
        ))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_invitation_sent(&self, guest_ids: &[String]) -> Result<u64, AppError> {
        self.update_ids("UPDATE guests SET invitation_sent = 1 WHERE invitation_sent = 0 AND id IN (", guest_ids).await
    }

    async fn mark_feedback_sent(&self, guest_ids: &[String]) -> Result<u64, AppError> {
        self.update_ids("UPDATE guests SET feedback_sent = 1 WHERE feedback_sent = 0 AND attended = 1 AND id IN (", guest_ids).await
    }

    async fn update_rsvp(&self, token: &str, update: &RsvpUpdate) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE guests SET rsvp_status = ?, name = ?, other_details = ?, barcode_data = ? WHERE unique_token = ? AND attended = 0",
        )
            .bind(update.rsvp_status.as_str())
            .bind(&update.name)
            .bind(Json(&update.other_details))
            .bind(&update.barcode_data)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, event_id: &str, guest_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM guests WHERE id = ? AND event_id = ?")
            .bind(guest_id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
