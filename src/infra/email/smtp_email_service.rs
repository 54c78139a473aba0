use crate::config::MailConfig;
use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error};

/// SMTP delivery built from explicit configuration at construction time.
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailService {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        // 465 is implicit TLS; everything else negotiates STARTTLS.
        let relay = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        };
        let builder = relay
            .map_err(|e| AppError::InternalWithMsg(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port);

        let builder = if config.smtp_username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(config.smtp_username.clone(), config.smtp_password.clone()))
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid MAIL_FROM address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn attachment_mime(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ics") => "text/calendar",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        let to = recipient.parse::<Mailbox>()
            .map_err(|e| AppError::Dependency(format!("Invalid recipient '{}': {}", recipient, e)))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject);

        let built = match (attachment_name, attachment_data) {
            (Some(name), Some(data)) => {
                let attachment = Attachment::new(name.to_string())
                    .body(data.to_vec(), ContentType::parse(attachment_mime(name)).unwrap_or(ContentType::TEXT_PLAIN));
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::html(html_body.to_string()))
                        .singlepart(attachment),
                )
            }
            _ => builder
                .header(ContentType::TEXT_HTML)
                .body(html_body.to_string()),
        };
        let message = built.map_err(|e| AppError::Dependency(format!("Failed to build message for {}: {}", recipient, e)))?;

        let response = self.transport.send(message).await.map_err(|e| {
            let msg = format!("SMTP delivery to {} failed: {}", recipient, e);
            error!("{}", msg);
            AppError::Dependency(msg)
        })?;

        debug!("SMTP accepted message for {}: {:?}", recipient, response.code());
        Ok(())
    }
}
