use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    Invitation,
    FeedbackRequest,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKind::Invitation => f.write_str("invitation"),
            DispatchKind::FeedbackRequest => f.write_str("feedback_request"),
        }
    }
}

/// Counts produced by one batch dispatch.
///
/// `deferred_count` covers candidates never attempted because the batch
/// deadline passed; they keep their flag unset and go out on the next run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub attempted_count: usize,
    pub sent_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub deferred_count: usize,
    pub updated_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every successful send has its idempotency flag persisted.
    Synced(DispatchSummary),
    /// Messages went out but the flag write failed; a retry will resend to
    /// `unsynced_guest_ids`.
    Unsynced {
        summary: DispatchSummary,
        unsynced_guest_ids: Vec<String>,
        reason: String,
    },
}

impl DispatchOutcome {
    pub fn summary(&self) -> &DispatchSummary {
        match self {
            DispatchOutcome::Synced(summary) => summary,
            DispatchOutcome::Unsynced { summary, .. } => summary,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, DispatchOutcome::Synced(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummary {
    pub submitted_count: usize,
    pub valid_count: usize,
    pub created_count: u64,
}
