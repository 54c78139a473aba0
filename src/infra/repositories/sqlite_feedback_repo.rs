use crate::domain::{
    models::feedback::{Feedback, FeedbackEntry},
    ports::FeedbackRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteFeedbackRepo {
    pool: SqlitePool,
}

impl SqliteFeedbackRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for SqliteFeedbackRepo {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, AppError> {
        sqlx::query_as::<_, Feedback>(
            "INSERT INTO feedback (id, guest_id, event_id, rating, comment, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING id, guest_id, event_id, rating, comment, created_at",
        )
            .bind(&feedback.id)
            .bind(&feedback.guest_id)
            .bind(&feedback.event_id)
            .bind(feedback.rating)
            .bind(&feedback.comment)
            .bind(feedback.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<FeedbackEntry>, AppError> {
        sqlx::query_as::<_, FeedbackEntry>(
            "SELECT f.id, f.rating, f.comment, f.created_at, g.name AS guest_name, g.email AS guest_email \
             FROM feedback f JOIN guests g ON f.guest_id = g.id \
             WHERE f.event_id = ? ORDER BY f.created_at DESC",
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
