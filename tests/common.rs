use rsvp_backend::{
    api::router::create_router,
    state::AppState,
    config::{Config, MailConfig},
    domain::models::{
        event::Event,
        guest::{Guest, GuestDetails, RsvpUpdate},
        rsvp::QrImage,
    },
    domain::ports::{EmailService, GuestRepository, QrRenderer},
    infra::{
        factory::{build_state, Repositories},
        qr::svg_qr_renderer::SvgQrRenderer,
    },
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashSet;
use std::sync::{atomic::{AtomicBool, Ordering}, Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tower::ServiceExt;
use serde_json::Value;

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: Option<String>,
}

/// Records every delivery; recipients in `failing` get an error instead.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub failing: HashSet<String>,
}

#[allow(dead_code)]
impl RecordingEmailService {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<SentEmail> {
        self.sent().into_iter().filter(|m| m.recipient == recipient).collect()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        _attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        if self.failing.contains(recipient) {
            return Err(AppError::Dependency(format!("mailbox {} rejected", recipient)));
        }

        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
            attachment_name: attachment_name.map(str::to_string),
        });
        Ok(())
    }
}

pub struct FailingQrRenderer;

#[async_trait]
impl QrRenderer for FailingQrRenderer {
    async fn render(&self, _payload: &str) -> Result<QrImage, AppError> {
        Err(AppError::Dependency("QR renderer unavailable".into()))
    }
}

/// Delegates to the real repository but can be told to fail the batch flag writes,
/// or to let a door scan land just before an RSVP write.
pub struct FlakyGuestRepo {
    inner: Arc<dyn GuestRepository>,
    pub fail_flag_writes: AtomicBool,
    pub scan_before_rsvp_write: AtomicBool,
}

fn flag_write_error() -> AppError {
    AppError::Database(sqlx::Error::Protocol("simulated write failure".into()))
}

#[async_trait]
impl GuestRepository for FlakyGuestRepo {
    async fn create_many(&self, guests: &[Guest]) -> Result<u64, AppError> {
        self.inner.create_many(guests).await
    }
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        self.inner.list_by_event(event_id).await
    }
    async fn find_by_token(&self, token: &str) -> Result<Option<GuestDetails>, AppError> {
        self.inner.find_by_token(token).await
    }
    async fn set_attended_if_unset(&self, barcode_data: &str) -> Result<bool, AppError> {
        self.inner.set_attended_if_unset(barcode_data).await
    }
    async fn list_attended_without_feedback(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        self.inner.list_attended_without_feedback(event_id).await
    }
    async fn mark_invitation_sent(&self, guest_ids: &[String]) -> Result<u64, AppError> {
        if self.fail_flag_writes.load(Ordering::SeqCst) {
            return Err(flag_write_error());
        }
        self.inner.mark_invitation_sent(guest_ids).await
    }
    async fn mark_feedback_sent(&self, guest_ids: &[String]) -> Result<u64, AppError> {
        if self.fail_flag_writes.load(Ordering::SeqCst) {
            return Err(flag_write_error());
        }
        self.inner.mark_feedback_sent(guest_ids).await
    }
    async fn update_rsvp(&self, token: &str, update: &RsvpUpdate) -> Result<u64, AppError> {
        if self.scan_before_rsvp_write.load(Ordering::SeqCst) {
            self.inner.set_attended_if_unset(token).await?;
        }
        self.inner.update_rsvp(token, update).await
    }
    async fn delete(&self, event_id: &str, guest_id: &str) -> Result<u64, AppError> {
        self.inner.delete(event_id, guest_id).await
    }
}

pub struct TestOptions {
    pub failing_recipients: Vec<String>,
    pub failing_qr: bool,
    pub dispatch_timeout: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            failing_recipients: Vec::new(),
            failing_qr: false,
            dispatch_timeout: Duration::from_secs(60),
        }
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<RecordingEmailService>,
    pub guests: Arc<FlakyGuestRepo>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            frontend_url: "https://rsvp.test".to_string(),
            mail: MailConfig {
                from_email: "noreply@rsvp.test".to_string(),
                from_name: "RSVP Test".to_string(),
                smtp_host: "localhost".to_string(),
                smtp_port: 2525,
                smtp_username: String::new(),
                smtp_password: String::new(),
                service_url: None,
                service_token: String::new(),
            },
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            dispatch_timeout: options.dispatch_timeout,
            send_timeout: Duration::from_secs(5),
        };

        let email = Arc::new(RecordingEmailService {
            sent: Mutex::new(Vec::new()),
            failing: options.failing_recipients.into_iter().collect(),
        });

        let mut repos = Repositories::sqlite(pool.clone());
        let guests = Arc::new(FlakyGuestRepo {
            inner: repos.guests.clone(),
            fail_flag_writes: AtomicBool::new(false),
            scan_before_rsvp_write: AtomicBool::new(false),
        });
        repos.guests = guests.clone();

        let qr_renderer: Arc<dyn QrRenderer> = if options.failing_qr {
            Arc::new(FailingQrRenderer)
        } else {
            Arc::new(SvgQrRenderer::default())
        };

        let state = Arc::new(build_state(&config, repos, email.clone(), qr_renderer));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            email,
            guests,
        }
    }

    pub fn auth(&self, user_id: &str, roles: &[&str]) -> AuthHeaders {
        let token = self.state.auth_service
            .issue(user_id, roles, chrono::Duration::minutes(15))
            .expect("Failed to issue test token");

        AuthHeaders {
            access_token: token.token,
            csrf_token: token.csrf_token,
        }
    }

    pub async fn create_event(&self, admin_id: &str, name: &str) -> Event {
        let event = Event::new(
            admin_id.to_string(),
            name.to_string(),
            Some("An evening of talks".to_string()),
            Some("Main Hall".to_string()),
            Utc.with_ymd_and_hms(2030, 6, 1, 19, 0, 0).unwrap(),
        );
        self.state.event_repo.create(&event).await.expect("Failed to create event")
    }

    /// Enrolls directly through the engine and returns the stored guests.
    pub async fn enroll(&self, event: &Event, emails: &[&str]) -> Vec<Guest> {
        let emails: Vec<String> = emails.iter().map(|e| e.to_string()).collect();
        self.state.lifecycle
            .enroll_guests(&event.id, &event.admin_id, &emails)
            .await
            .expect("Failed to enroll guests");
        self.state.guest_repo.list_by_event(&event.id).await.unwrap()
    }

    pub async fn guest(&self, guest_id: &str) -> Guest {
        sqlx::query_as::<_, Guest>(
            "SELECT id, event_id, email, name, unique_token, rsvp_status, invitation_sent, attended, feedback_sent, barcode_data, other_details, created_at FROM guests WHERE id = ?"
        )
            .bind(guest_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn call(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// The confirmation email is sent from a spawned task.
    pub async fn wait_for_email_to(&self, recipient: &str) -> Vec<SentEmail> {
        for _ in 0..100 {
            let sent = self.email.sent_to(recipient);
            if !sent.is_empty() {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Vec::new()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
