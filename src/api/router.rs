use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{checkin, feedback, guest, health, rsvp};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Admin: guests & dispatch
        .route("/api/events/{event_id}/guests", post(guest::enroll_guests).get(guest::list_guests))
        .route("/api/events/{event_id}/guests/{guest_id}", delete(guest::delete_guest))
        .route("/api/events/{event_id}/send-invitations", post(guest::send_invitations))
        .route("/api/events/{event_id}/send-feedback", post(guest::send_feedback_requests))
        .route("/api/events/{event_id}/feedback", get(feedback::list_feedback))

        // Public, token-addressed
        .route("/api/rsvp/{token}", get(rsvp::get_rsvp_details).post(rsvp::submit_rsvp))
        .route("/api/feedback/{token}", post(feedback::submit_feedback))

        // Door staff
        .route("/api/checkin", post(checkin::check_in))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
