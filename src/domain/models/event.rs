use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub admin_id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        admin_id: String,
        name: String,
        description: Option<String>,
        location: Option<String>,
        event_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            name,
            description,
            location,
            event_date,
            created_at: Utc::now(),
        }
    }
}
