use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::SubmitRsvpRequest, responses::RsvpResponse};
use crate::error::AppError;
use std::sync::Arc;

pub async fn get_rsvp_details(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.lifecycle.rsvp_details(&token).await?;
    Ok(Json(details))
}

pub async fn submit_rsvp(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<SubmitRsvpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.lifecycle
        .submit_rsvp(&token, &payload.name, &payload.status, payload.other_details)
        .await?;

    Ok(Json(RsvpResponse {
        message: format!("RSVP recorded as {}", result.status),
        status: result.status,
        qr_code: result.qr_image.map(|image| image.data_url),
    }))
}
