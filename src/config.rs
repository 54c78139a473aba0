use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub frontend_url: String,
    pub mail: MailConfig,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub dispatch_timeout: Duration,
    pub send_timeout: Duration,
}

#[derive(Clone)]
pub struct MailConfig {
    pub from_email: String,
    pub from_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// When set, mail goes through the HTTP relay instead of SMTP.
    pub service_url: Option<String>,
    pub service_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            mail: MailConfig::from_env(),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.rsvp.local".to_string()),
            dispatch_timeout: secs_from_env("DISPATCH_TIMEOUT_SECS", 300),
            send_timeout: secs_from_env("SEND_TIMEOUT_SECS", 30),
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            from_email: env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@rsvp.local".to_string()),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Event Invitations".to_string()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env::var("SMTP_PORT").unwrap_or_else(|_| "587".to_string()).parse().expect("SMTP_PORT must be a number"),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            service_url: env::var("MAIL_SERVICE_URL").ok().filter(|url| !url.is_empty()),
            service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
        }
    }
}

fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{} must be a number of seconds", key)))
        .unwrap_or(default);
    Duration::from_secs(secs)
}
