use crate::domain::{models::event::Event, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, admin_id, name, description, location, event_date, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id, admin_id, name, description, location, event_date, created_at",
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
            "SELECT id, admin_id, name, description, location, event_date, created_at FROM events WHERE id = $1 AND admin_id = $2",
        )
            .bind(id)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
