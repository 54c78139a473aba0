use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only; submitting feedback never mutates the guest row.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Feedback {
    pub id: String,
    pub guest_id: String,
    pub event_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(guest_id: String, event_id: String, rating: i32, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            guest_id,
            event_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct FeedbackEntry {
    pub id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub guest_name: Option<String>,
    pub guest_email: String,
}
