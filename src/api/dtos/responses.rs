use crate::domain::models::{
    dispatch::{DispatchOutcome, DispatchSummary, EnrollmentSummary},
    guest::RsvpStatus,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct EnrollmentResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: EnrollmentSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: DispatchSummary,
    pub unsynced: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unsynced_guest_ids: Vec<String>,
}

impl DispatchResponse {
    pub fn from_outcome(label: &str, outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Synced(summary) => Self {
                message: format!(
                    "{} sent: {}, skipped: {}, failed: {}, deferred: {}",
                    label, summary.sent_count, summary.skipped_count, summary.error_count, summary.deferred_count
                ),
                summary,
                unsynced: false,
                unsynced_guest_ids: Vec::new(),
            },
            DispatchOutcome::Unsynced { summary, unsynced_guest_ids, .. } => Self {
                message: format!(
                    "{} were sent to {} guests but their status could not be saved; a retry will resend them",
                    label, unsynced_guest_ids.len()
                ),
                summary,
                unsynced: true,
                unsynced_guest_ids,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub message: String,
    pub status: RsvpStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub message: String,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_checked_in: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCreatedResponse {
    pub message: String,
    pub feedback_id: String,
}
