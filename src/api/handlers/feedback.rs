use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{requests::SubmitFeedbackRequest, responses::FeedbackCreatedResponse};
use crate::domain::models::auth::ROLE_ADMIN;
use crate::error::AppError;
use std::sync::Arc;

pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let feedback = state.lifecycle
        .submit_feedback(&token, payload.rating, payload.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackCreatedResponse {
            message: "Thank you for your feedback!".to_string(),
            feedback_id: feedback.id,
        }),
    ))
}

pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let admin = user.require_any(&[ROLE_ADMIN])?;
    let entries = state.lifecycle.list_feedback(&event_id, &admin.user_id).await?;
    Ok(Json(entries))
}
