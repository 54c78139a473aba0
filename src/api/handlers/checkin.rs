use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{requests::CheckInRequest, responses::CheckInResponse};
use crate::domain::models::{
    auth::{ROLE_ADMIN, ROLE_SCANNER},
    checkin::{CheckInOutcome, CheckedInGuest},
};
use crate::error::AppError;
use std::sync::Arc;

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CheckInRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_any(&[ROLE_ADMIN, ROLE_SCANNER])?;

    let outcome = state.lifecycle.record_attendance(&payload.barcode_data).await?;

    let (status, body) = match outcome {
        CheckInOutcome::CheckedIn(guest) => (
            StatusCode::OK,
            response(format!("Checked in {}", label(&guest)), Some(guest), false),
        ),
        CheckInOutcome::AlreadyCheckedIn(guest) => (
            StatusCode::CONFLICT,
            response(format!("{} has already checked in", label(&guest)), Some(guest), true),
        ),
        CheckInOutcome::NotConfirmed(guest) => (
            StatusCode::CONFLICT,
            response(format!("{} has not confirmed attendance", label(&guest)), Some(guest), false),
        ),
        CheckInOutcome::UnknownPayload => (
            StatusCode::NOT_FOUND,
            response("Check-in failed: unknown or invalid code".to_string(), None, false),
        ),
    };

    Ok((status, Json(body)))
}

fn label(guest: &CheckedInGuest) -> &str {
    guest.guest_name.as_deref().unwrap_or(&guest.guest_email)
}

fn response(message: String, guest: Option<CheckedInGuest>, already_checked_in: bool) -> CheckInResponse {
    CheckInResponse {
        message,
        guest_name: guest.as_ref().and_then(|g| g.guest_name.clone()),
        guest_email: guest.map(|g| g.guest_email),
        already_checked_in,
    }
}
