use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tera::{Context, Tera};
use tracing::debug;

use crate::domain::{
    models::{event::Event, guest::{Guest, GuestDetails}, rsvp::QrImage},
    ports::EmailService,
};
use crate::error::AppError;

pub const INVITATION_TEMPLATE: &str = "invitation.html";
pub const CONFIRMATION_TEMPLATE: &str = "rsvp_confirmation.html";
pub const FEEDBACK_TEMPLATE: &str = "feedback_request.html";

const LOCATION_FALLBACK: &str = "To be announced";

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(INVITATION_TEMPLATE, include_str!("../../templates/invitation.html"))?;
    tera.add_raw_template(CONFIRMATION_TEMPLATE, include_str!("../../templates/rsvp_confirmation.html"))?;
    tera.add_raw_template(FEEDBACK_TEMPLATE, include_str!("../../templates/feedback_request.html"))?;
    Ok(tera)
}

/// Event fields shown in every guest-facing message.
pub struct EventView<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub date: DateTime<Utc>,
}

impl<'a> From<&'a Event> for EventView<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            name: &event.name,
            description: event.description.as_deref(),
            location: event.location.as_deref(),
            date: event.event_date,
        }
    }
}

impl<'a> From<&'a GuestDetails> for EventView<'a> {
    fn from(details: &'a GuestDetails) -> Self {
        Self {
            name: &details.event_name,
            description: details.event_description.as_deref(),
            location: details.event_location.as_deref(),
            date: details.event_date,
        }
    }
}

/// Renders guest-facing messages and hands them to the configured
/// [`EmailService`], bounding each delivery by `send_timeout`.
pub struct Notifier {
    email_service: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    frontend_url: String,
    send_timeout: Duration,
}

impl Notifier {
    pub fn new(
        email_service: Arc<dyn EmailService>,
        templates: Arc<Tera>,
        frontend_url: String,
        send_timeout: Duration,
    ) -> Self {
        Self {
            email_service,
            templates,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            send_timeout,
        }
    }

    pub fn rsvp_link(&self, token: &str) -> String {
        format!("{}/rsvp/{}", self.frontend_url, token)
    }

    pub fn feedback_link(&self, token: &str) -> String {
        format!("{}/feedback/{}", self.frontend_url, token)
    }

    pub async fn send_invitation(&self, event: &Event, guest: &Guest) -> Result<(), AppError> {
        let mut context = event_context(&EventView::from(event));
        context.insert("link", &self.rsvp_link(&guest.unique_token));

        let body = self.render(INVITATION_TEMPLATE, &context)?;
        let subject = format!("Invitation: {}", event.name);
        self.deliver(&guest.email, &subject, &body, None).await
    }

    pub async fn send_rsvp_confirmation(&self, details: &GuestDetails, guest_name: &str, qr: &QrImage) -> Result<(), AppError> {
        let mut context = event_context(&EventView::from(details));
        context.insert("guest_name", guest_name);
        context.insert("qr_data_url", &qr.data_url);

        let body = self.render(CONFIRMATION_TEMPLATE, &context)?;
        let subject = format!("Your attendance is confirmed: {}", details.event_name);
        self.deliver(&details.guest.email, &subject, &body, Some(("ticket.svg", &qr.bytes))).await
    }

    pub async fn send_feedback_request(&self, event: &Event, guest: &Guest) -> Result<(), AppError> {
        let mut context = event_context(&EventView::from(event));
        context.insert("link", &self.feedback_link(&guest.unique_token));

        let body = self.render(FEEDBACK_TEMPLATE, &context)?;
        let subject = format!("Feedback on {}", event.name);
        self.deliver(&guest.email, &subject, &body, None).await
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, AppError> {
        self.templates.render(template, context)
            .map_err(|e| AppError::InternalWithMsg(format!("Template {} failed to render: {:?}", template, e)))
    }

    async fn deliver(&self, recipient: &str, subject: &str, body: &str, attachment: Option<(&str, &[u8])>) -> Result<(), AppError> {
        let (attachment_name, attachment_data) = match attachment {
            Some((name, data)) => (Some(name), Some(data)),
            None => (None, None),
        };

        debug!("Delivering '{}' to {}", subject, recipient);
        tokio::time::timeout(
            self.send_timeout,
            self.email_service.send(recipient, subject, body, attachment_name, attachment_data),
        )
            .await
            .map_err(|_| AppError::Dependency(format!("Mail delivery to {} timed out after {:?}", recipient, self.send_timeout)))?
    }
}

fn event_context(event: &EventView<'_>) -> Context {
    let mut context = Context::new();
    context.insert("event_name", event.name);
    context.insert("event_date", &event.date.format("%Y-%m-%d %H:%M UTC").to_string());
    context.insert("event_location", event.location.filter(|l| !l.trim().is_empty()).unwrap_or(LOCATION_FALLBACK));
    context.insert("event_description", event.description.unwrap_or(""));
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_templates_render_event_fields() {
        let tera = load_templates().unwrap();
        let event = Event::new(
            "admin-1".into(),
            "Launch <Party>".into(),
            None,
            None,
            Utc.with_ymd_and_hms(2026, 5, 1, 18, 30, 0).unwrap(),
        );

        let mut context = event_context(&EventView::from(&event));
        context.insert("link", "https://app.example.com/rsvp/TOKEN123");
        let body = tera.render(INVITATION_TEMPLATE, &context).unwrap();

        assert!(body.contains("Launch &lt;Party&gt;"), "event name should be escaped");
        assert!(body.contains("2026-05-01 18:30 UTC"));
        assert!(body.contains("To be announced"));
        assert!(body.contains("href=\"https://app.example.com/rsvp/TOKEN123\""));

        let mut context = event_context(&EventView::from(&event));
        context.insert("link", "https://app.example.com/feedback/TOKEN123");
        let body = tera.render(FEEDBACK_TEMPLATE, &context).unwrap();
        assert!(body.contains("/feedback/TOKEN123"));
    }

    #[test]
    fn test_confirmation_template_embeds_qr() {
        let tera = load_templates().unwrap();
        let event = Event::new("admin-1".into(), "Gala".into(), Some("Black tie".into()), Some("Main Hall".into()), Utc::now());

        let mut context = event_context(&EventView::from(&event));
        context.insert("guest_name", "Ada");
        context.insert("qr_data_url", "data:image/svg+xml;base64,AAAA");
        let body = tera.render(CONFIRMATION_TEMPLATE, &context).unwrap();

        assert!(body.contains("Ada"));
        assert!(body.contains("Main Hall"));
        assert!(body.contains("src=\"data:image/svg+xml;base64,AAAA\""));
    }
}
