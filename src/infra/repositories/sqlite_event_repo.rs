use crate::domain::{models::event::Event, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, admin_id, name, description, location, event_date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id, admin_id, name, description, location, event_date, created_at",
        )
            .bind(&event.id)
            .bind(&event.admin_id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.event_date)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_owned(&self, id: &str, admin_id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT id, admin_id, name, description, location, event_date, created_at FROM events WHERE id = ? AND admin_id = ?",
        )
            .bind(id)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
