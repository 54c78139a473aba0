use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{EmailService, EventRepository, FeedbackRepository, GuestRepository, QrRenderer};
use crate::domain::services::{
    auth_service::AuthService,
    guest_lifecycle::GuestLifecycle,
    notifier::{load_templates, Notifier},
};
use crate::infra::email::{http_email_service::HttpEmailService, smtp_email_service::SmtpEmailService};
use crate::infra::qr::svg_qr_renderer::SvgQrRenderer;
use crate::infra::repositories::{
    postgres_event_repo::PostgresEventRepo, postgres_feedback_repo::PostgresFeedbackRepo,
    postgres_guest_repo::PostgresGuestRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_feedback_repo::SqliteFeedbackRepo,
    sqlite_guest_repo::SqliteGuestRepo,
};

pub struct Repositories {
    pub events: Arc<dyn EventRepository>,
    pub guests: Arc<dyn GuestRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            events: Arc::new(SqliteEventRepo::new(pool.clone())),
            guests: Arc::new(SqliteGuestRepo::new(pool.clone())),
            feedback: Arc::new(SqliteFeedbackRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            guests: Arc::new(PostgresGuestRepo::new(pool.clone())),
            feedback: Arc::new(PostgresFeedbackRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let email_service: Arc<dyn EmailService> = match &config.mail.service_url {
        Some(url) => {
            info!("Delivering mail through HTTP relay at {}", url);
            Arc::new(HttpEmailService::new(
                url.clone(),
                config.mail.service_token.clone(),
                config.mail.from_name.clone(),
                config.send_timeout,
            ).expect("Failed to initialize mail relay client"))
        }
        None => {
            info!("Delivering mail over SMTP via {}:{}", config.mail.smtp_host, config.mail.smtp_port);
            Arc::new(SmtpEmailService::new(&config.mail).expect("Failed to initialize SMTP transport"))
        }
    };

    let qr_renderer: Arc<dyn QrRenderer> = Arc::new(SvgQrRenderer::default());

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    build_state(config, repos, email_service, qr_renderer)
}

/// Wires the engine and its collaborators around already-open repositories.
pub fn build_state(
    config: &Config,
    repos: Repositories,
    email_service: Arc<dyn EmailService>,
    qr_renderer: Arc<dyn QrRenderer>,
) -> AppState {
    let templates = Arc::new(load_templates().expect("Failed to load mail templates"));
    let notifier = Arc::new(Notifier::new(
        email_service,
        templates,
        config.frontend_url.clone(),
        config.send_timeout,
    ));

    let lifecycle = Arc::new(GuestLifecycle::new(
        repos.events.clone(),
        repos.guests.clone(),
        repos.feedback,
        qr_renderer,
        notifier,
        config.dispatch_timeout,
    ));

    AppState {
        config: config.clone(),
        event_repo: repos.events,
        guest_repo: repos.guests,
        lifecycle,
        auth_service: Arc::new(AuthService::new(config)),
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
