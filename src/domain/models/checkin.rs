use serde::Serialize;

/// Identity echoed back to the scanning operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedInGuest {
    pub guest_id: String,
    pub event_id: String,
    pub guest_name: Option<String>,
    pub guest_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn(CheckedInGuest),
    AlreadyCheckedIn(CheckedInGuest),
    /// Payload matches a guest whose RSVP is not CONFIRMED.
    NotConfirmed(CheckedInGuest),
    UnknownPayload,
}
