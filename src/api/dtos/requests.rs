use serde::Deserialize;
use serde_json::{Map, Value};

/// Candidate emails; non-string entries are ignored like malformed addresses.
#[derive(Deserialize)]
pub struct EnrollGuestsRequest {
    #[serde(default)]
    pub emails: Vec<Value>,
}

#[derive(Deserialize)]
pub struct SubmitRsvpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(alias = "otherDetails")]
    pub other_details: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[serde(default, alias = "barcode_data")]
    pub barcode_data: String,
}

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}
