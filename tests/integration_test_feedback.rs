mod common;

use axum::http::StatusCode;
use common::{TestApp, TestOptions};
use rsvp_backend::domain::models::{auth::ROLE_ADMIN, guest::Guest};
use serde_json::json;
use std::sync::atomic::Ordering;

async fn attend(app: &TestApp, guest: &Guest, name: &str) {
    app.state.lifecycle.submit_rsvp(&guest.unique_token, name, "CONFIRMED", None).await.unwrap();
    app.state.lifecycle.record_attendance(&guest.unique_token).await.unwrap();
}

#[tokio::test]
async fn test_feedback_requests_only_reach_attendees_once() {
    let app = TestApp::new().await;
    let event = app.create_event("admin-1", "Launch").await;
    let guests = app.enroll(&event, &["a@x.com", "b@x.com", "c@x.com"]).await;
    attend(&app, &guests[0], "Ada").await;
    attend(&app, &guests[2], "Cy").await;
    app.wait_for_email_to("a@x.com").await;
    app.wait_for_email_to("c@x.com").await;

    let auth = app.auth("admin-1", &[ROLE_ADMIN]);
    let uri = format!("/api/events/{}/send-feedback", event.id);

    let (status, body) = app.call("POST", &uri, Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentCount"], 2);
    assert_eq!(body["updatedCount"], 2);

    let requests: Vec<_> = app.email.sent().into_iter().filter(|m| m.subject == "Feedback on Launch").collect();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|m| m.recipient != "b@x.com"));
    let link = format!("https://rsvp.test/feedback/{}", guests[0].unique_token);
    assert!(requests.iter().any(|m| m.body.contains(&link)));

    assert!(app.guest(&guests[0].id).await.feedback_sent);
    assert!(!app.guest(&guests[1].id).await.feedback_sent);

    let (status, body) = app.call("POST", &uri, Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentCount"], 0);
    let requests = app.email.sent().into_iter().filter(|m| m.subject == "Feedback on Launch").count();
    assert_eq!(requests, 2);
}

#[tokio::test]
async fn test_feedback_dispatch_unsynced() {
    let app = TestApp::with_options(TestOptions::default()).await;
    let event = app.create_event("admin-1", "Launch").await;
    let guests = app.enroll(&event, &["a@x.com"]).await;
    attend(&app, &guests[0], "Ada").await;

    app.guests.fail_flag_writes.store(true, Ordering::SeqCst);
    let outcome = app.state.lifecycle.dispatch_feedback_requests(&event.id, "admin-1").await.unwrap();
    assert!(!outcome.is_synced());
    assert_eq!(outcome.summary().sent_count, 1);
    assert!(!app.guest(&guests[0].id).await.feedback_sent);
}

#[tokio::test]
async fn test_submit_and_list_feedback() {
    let app = TestApp::new().await;
    let event = app.create_event("admin-1", "Launch").await;
    let guests = app.enroll(&event, &["a@x.com"]).await;
    attend(&app, &guests[0], "Ada").await;
    let uri = format!("/api/feedback/{}", guests[0].unique_token);

    let (status, body) = app.call("POST", &uri, None, Some(json!({ "rating": 4, "comment": "Great talks" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["feedbackId"].as_str().is_some());

    // Append-only: a second entry is kept too.
    let (status, _) = app.call("POST", &uri, None, Some(json!({ "rating": 5 }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let auth = app.auth("admin-1", &[ROLE_ADMIN]);
    let (status, body) = app.call("GET", &format!("/api/events/{}/feedback", event.id), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rating"], 5, "newest first");
    assert_eq!(entries[1]["comment"], "Great talks");
    assert_eq!(entries[1]["guest_name"], "Ada");
    assert_eq!(entries[1]["guest_email"], "a@x.com");

    let outsider = app.auth("admin-2", &[ROLE_ADMIN]);
    let (status, _) = app.call("GET", &format!("/api/events/{}/feedback", event.id), Some(&outsider), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_validation() {
    let app = TestApp::new().await;
    let event = app.create_event("admin-1", "Launch").await;
    let guests = app.enroll(&event, &["a@x.com"]).await;
    let uri = format!("/api/feedback/{}", guests[0].unique_token);

    let (status, _) = app.call("POST", &uri, None, Some(json!({ "comment": "no rating" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", &uri, None, Some(json!({ "rating": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", &uri, None, Some(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", "/api/feedback/unknown", None, Some(json!({ "rating": 3 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let entries = app.state.lifecycle.list_feedback(&event.id, "admin-1").await.unwrap();
    assert!(entries.is_empty());
}
