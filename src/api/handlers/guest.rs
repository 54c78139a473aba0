use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{requests::EnrollGuestsRequest, responses::{DispatchResponse, EnrollmentResponse}};
use crate::domain::models::{auth::ROLE_ADMIN, dispatch::DispatchOutcome};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn enroll_guests(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<EnrollGuestsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;

    let candidates: Vec<String> = payload.emails
        .into_iter()
        .map(|value| value.as_str().unwrap_or_default().to_string())
        .collect();

    let summary = state.lifecycle.enroll_guests(&event_id, &admin.user_id, &candidates).await?;

    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse {
            message: format!("{} guests added (duplicates ignored)", summary.created_count),
            summary,
        }),
    ))
}

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;
    let guests = state.lifecycle.list_guests(&event_id, &admin.user_id).await?;
    Ok(Json(guests))
}

pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((event_id, guest_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;
    state.lifecycle.delete_guest(&event_id, &admin.user_id, &guest_id).await?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn send_invitations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;
    info!("Invitation dispatch requested for event {}", event_id);

    let outcome = state.lifecycle.dispatch_invitations(&event_id, &admin.user_id).await?;
    Ok(dispatch_response("Invitations", outcome))
}

pub async fn send_feedback_requests(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;
    info!("Feedback request dispatch requested for event {}", event_id);

    let outcome = state.lifecycle.dispatch_feedback_requests(&event_id, &admin.user_id).await?;
    Ok(dispatch_response("Feedback requests", outcome))
}

fn dispatch_response(label: &str, outcome: DispatchOutcome) -> impl IntoResponse {
    let status = if outcome.is_synced() { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    (status, Json(DispatchResponse::from_outcome(label, outcome)))
}
