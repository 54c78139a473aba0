use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsvpStatus {
    Pending,
    Confirmed,
    Declined,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "PENDING",
            RsvpStatus::Confirmed => "CONFIRMED",
            RsvpStatus::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(RsvpStatus::Pending),
            "CONFIRMED" => Ok(RsvpStatus::Confirmed),
            "DECLINED" => Ok(RsvpStatus::Declined),
            other => Err(format!("unknown rsvp status '{}'", other)),
        }
    }
}

impl TryFrom<String> for RsvpStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One invitee of one event. `unique_token` is the key behind every external
/// touchpoint: invitation link, RSVP link, QR payload and feedback link.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Guest {
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub name: Option<String>,
    pub unique_token: String,
    #[sqlx(try_from = "String")]
    pub rsvp_status: RsvpStatus,
    pub invitation_sent: bool,
    pub attended: bool,
    pub feedback_sent: bool,
    pub barcode_data: Option<String>,
    pub other_details: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

impl Guest {
    pub fn new(event_id: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            email,
            name: None,
            unique_token: generate_token(),
            rsvp_status: RsvpStatus::Pending,
            invitation_sent: false,
            attended: false,
            feedback_sent: false,
            barcode_data: None,
            other_details: Json(Map::new()),
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A guest resolved by token, joined with the owning event's display fields.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct GuestDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub guest: Guest,
    pub event_name: String,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub event_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RsvpUpdate {
    pub rsvp_status: RsvpStatus,
    pub name: String,
    pub other_details: Map<String, Value>,
    pub barcode_data: String,
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Trims candidates and keeps the plausible ones (non-empty, containing '@'),
/// dropping repeats within the same list.
pub fn filter_candidate_emails<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|email| !email.is_empty() && email.contains('@'))
        .filter(|email| seen.insert(email.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_candidate_emails() {
        let kept = filter_candidate_emails(&["a@x.com", " b@x.com ", "bad", "", "   ", "a@x.com"]);
        assert_eq!(kept, vec!["a@x.com".to_string(), "b@x.com".to_string()]);
    }

    #[test]
    fn test_rsvp_status_parsing() {
        assert_eq!("confirmed".parse::<RsvpStatus>().unwrap(), RsvpStatus::Confirmed);
        assert_eq!(" DECLINED".parse::<RsvpStatus>().unwrap(), RsvpStatus::Declined);
        assert!("MAYBE".parse::<RsvpStatus>().is_err());
        assert_eq!(RsvpStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn test_new_guest_defaults() {
        let guest = Guest::new("event-1".into(), "a@x.com".into());
        assert_eq!(guest.rsvp_status, RsvpStatus::Pending);
        assert_eq!(guest.unique_token.len(), 32);
        assert!(!guest.invitation_sent && !guest.attended && !guest.feedback_sent);
        assert!(guest.barcode_data.is_none());
        assert_eq!(guest.display_name(), "a@x.com");

        let other = Guest::new("event-1".into(), "b@x.com".into());
        assert_ne!(guest.unique_token, other.unique_token);
    }
}
