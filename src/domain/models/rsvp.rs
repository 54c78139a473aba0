use chrono::{DateTime, Utc};
use serde::Serialize;

use super::guest::RsvpStatus;

/// Rendered QR code for a guest's check-in payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrImage {
    pub payload: String,
    pub mime_type: String,
    pub data_url: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResult {
    pub status: RsvpStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_image: Option<QrImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpEventView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpGuestView {
    pub email: String,
    pub status: RsvpStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpDetails {
    pub event: RsvpEventView,
    pub guest: RsvpGuestView,
}
