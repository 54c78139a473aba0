use crate::domain::models::{
    event::Event,
    feedback::{Feedback, FeedbackEntry},
    guest::{Guest, GuestDetails, RsvpUpdate},
    rsvp::QrImage,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    /// Returns the event only when `admin_id` owns it.
    async fn find_owned(&self, id: &str, admin_id: &str) -> Result<Option<Event>, AppError>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    /// Inserts the guests, skipping any whose (event, email) pair already exists.
    /// Returns the number of rows actually created.
    async fn create_many(&self, guests: &[Guest]) -> Result<u64, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Guest>, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<GuestDetails>, AppError>;
    /// Atomically flips `attended` for the confirmed guest carrying `barcode_data`.
    /// Returns `true` only for the single caller that performed the flip.
    async fn set_attended_if_unset(&self, barcode_data: &str) -> Result<bool, AppError>;
    async fn list_attended_without_feedback(&self, event_id: &str) -> Result<Vec<Guest>, AppError>;
    async fn mark_invitation_sent(&self, guest_ids: &[String]) -> Result<u64, AppError>;
    async fn mark_feedback_sent(&self, guest_ids: &[String]) -> Result<u64, AppError>;
    /// Writes the answer only while the guest has not checked in; 0 rows otherwise.
    async fn update_rsvp(&self, token: &str, update: &RsvpUpdate) -> Result<u64, AppError>;
    async fn delete(&self, event_id: &str, guest_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<FeedbackEntry>, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

#[async_trait]
pub trait QrRenderer: Send + Sync {
    async fn render(&self, payload: &str) -> Result<QrImage, AppError>;
}
