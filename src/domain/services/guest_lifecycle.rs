use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::{
    models::{
        checkin::{CheckInOutcome, CheckedInGuest},
        dispatch::{DispatchKind, DispatchOutcome, DispatchSummary, EnrollmentSummary},
        event::Event,
        feedback::{Feedback, FeedbackEntry},
        guest::{filter_candidate_emails, Guest, GuestDetails, RsvpStatus, RsvpUpdate},
        rsvp::{QrImage, RsvpDetails, RsvpEventView, RsvpGuestView, RsvpResult},
    },
    ports::{EventRepository, FeedbackRepository, GuestRepository, QrRenderer},
    services::notifier::Notifier,
};
use crate::error::AppError;

/// Five-point rating scale; values outside it are rejected, not clamped.
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Drives every guest state transition:
/// invited -> RSVP'd -> checked in -> feedback requested -> feedback submitted.
///
/// Callers are expected to have authorized the request already; admin ids
/// are only used to scope event lookups to their owner.
pub struct GuestLifecycle {
    events: Arc<dyn EventRepository>,
    guests: Arc<dyn GuestRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    qr_renderer: Arc<dyn QrRenderer>,
    notifier: Arc<Notifier>,
    dispatch_timeout: Duration,
}

impl GuestLifecycle {
    pub fn new(
        events: Arc<dyn EventRepository>,
        guests: Arc<dyn GuestRepository>,
        feedback: Arc<dyn FeedbackRepository>,
        qr_renderer: Arc<dyn QrRenderer>,
        notifier: Arc<Notifier>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self { events, guests, feedback, qr_renderer, notifier, dispatch_timeout }
    }

    pub async fn enroll_guests(&self, event_id: &str, admin_id: &str, candidates: &[String]) -> Result<EnrollmentSummary, AppError> {
        if candidates.is_empty() {
            return Err(AppError::Validation("A list of guest emails is required".into()));
        }

        let event = self.owned_event(event_id, admin_id).await?;

        let emails = filter_candidate_emails(candidates);
        if emails.is_empty() {
            return Err(AppError::Validation("No valid emails were provided".into()));
        }

        let guests: Vec<Guest> = emails
            .into_iter()
            .map(|email| Guest::new(event.id.clone(), email))
            .collect();

        let created_count = self.guests.create_many(&guests).await?;
        info!(
            "Enrolled {} new guests for event {} ({} valid of {} submitted, duplicates ignored)",
            created_count, event.id, guests.len(), candidates.len()
        );

        Ok(EnrollmentSummary {
            submitted_count: candidates.len(),
            valid_count: guests.len(),
            created_count,
        })
    }

    pub async fn dispatch_invitations(&self, event_id: &str, admin_id: &str) -> Result<DispatchOutcome, AppError> {
        let event = self.owned_event(event_id, admin_id).await?;
        let guests = self.guests.list_by_event(&event.id).await?;
        info!("Found {} guests for event {}", guests.len(), event.id);

        self.dispatch(DispatchKind::Invitation, &event, guests).await
    }

    pub async fn dispatch_feedback_requests(&self, event_id: &str, admin_id: &str) -> Result<DispatchOutcome, AppError> {
        let event = self.owned_event(event_id, admin_id).await?;
        let guests = self.guests.list_attended_without_feedback(&event.id).await?;
        info!("Found {} attended guests without a feedback request for event {}", guests.len(), event.id);

        self.dispatch(DispatchKind::FeedbackRequest, &event, guests).await
    }

    pub async fn rsvp_details(&self, token: &str) -> Result<RsvpDetails, AppError> {
        let details = self.resolve_token(token).await?;

        Ok(RsvpDetails {
            event: RsvpEventView {
                id: details.guest.event_id.clone(),
                name: details.event_name,
                description: details.event_description,
                location: details.event_location,
                date: details.event_date,
            },
            guest: RsvpGuestView {
                email: details.guest.email,
                status: details.guest.rsvp_status,
            },
        })
    }

    /// Records the guest's answer, overwriting any earlier one. A confirmed
    /// answer is only persisted together with a rendered QR code.
    pub async fn submit_rsvp(
        &self,
        token: &str,
        name: &str,
        status: &str,
        other_details: Option<Map<String, Value>>,
    ) -> Result<RsvpResult, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }

        let status = match status.parse::<RsvpStatus>() {
            Ok(status @ (RsvpStatus::Confirmed | RsvpStatus::Declined)) => status,
            _ => return Err(AppError::Validation("Status must be CONFIRMED or DECLINED".into())),
        };

        let mut details = self.resolve_token(token).await?;
        if details.guest.attended {
            return Err(already_attended());
        }

        let qr_image = if status == RsvpStatus::Confirmed {
            let image = self.qr_renderer.render(&details.guest.unique_token).await.map_err(|e| {
                error!("QR generation failed for guest {}: {}", details.guest.id, e);
                match e {
                    AppError::Dependency(msg) => AppError::Dependency(msg),
                    other => AppError::Dependency(format!("QR generation failed: {}", other)),
                }
            })?;
            Some(image)
        } else {
            None
        };

        let update = RsvpUpdate {
            rsvp_status: status,
            name: name.to_string(),
            other_details: other_details.unwrap_or_default(),
            barcode_data: details.guest.unique_token.clone(),
        };

        if self.guests.update_rsvp(token, &update).await? == 0 {
            // A scan may have landed since the read above.
            return Err(match self.guests.find_by_token(token).await? {
                Some(current) if current.guest.attended => already_attended(),
                _ => AppError::NotFound("Invitation not found or no longer valid".into()),
            });
        }
        info!("Guest {} answered RSVP with {}", details.guest.id, status);

        if let Some(image) = &qr_image {
            details.guest.name = Some(update.name.clone());
            details.guest.rsvp_status = status;
            details.guest.barcode_data = Some(update.barcode_data.clone());
            self.spawn_confirmation_email(details, image.clone());
        }

        Ok(RsvpResult { status, qr_image })
    }

    /// Check-in by scanned QR payload. The store's compare-and-set decides the
    /// single winner when several scanners race on the same guest.
    pub async fn record_attendance(&self, payload: &str) -> Result<CheckInOutcome, AppError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(AppError::Validation("Barcode data is required".into()));
        }

        let Some(details) = self.guests.find_by_token(payload).await? else {
            warn!("Check-in attempted with unknown payload");
            return Ok(CheckInOutcome::UnknownPayload);
        };

        if self.guests.set_attended_if_unset(payload).await? {
            info!("Guest {} checked in for event {}", details.guest.id, details.guest.event_id);
            return Ok(CheckInOutcome::CheckedIn(checked_in_view(&details.guest)));
        }

        // Lost the race or not eligible; re-read to tell which.
        let outcome = match self.guests.find_by_token(payload).await? {
            Some(current) if current.guest.attended => CheckInOutcome::AlreadyCheckedIn(checked_in_view(&current.guest)),
            Some(current) => CheckInOutcome::NotConfirmed(checked_in_view(&current.guest)),
            None => CheckInOutcome::UnknownPayload,
        };
        debug!("Check-in for guest {} not applied: {:?}", details.guest.id, outcome);
        Ok(outcome)
    }

    pub async fn submit_feedback(&self, token: &str, rating: Option<i32>, comment: Option<String>) -> Result<Feedback, AppError> {
        let rating = rating.ok_or_else(|| AppError::Validation("Rating is required".into()))?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING)));
        }

        let details = self.guests.find_by_token(token).await?
            .ok_or_else(|| AppError::NotFound("Feedback link is invalid or the guest was not found".into()))?;

        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let feedback = Feedback::new(details.guest.id.clone(), details.guest.event_id.clone(), rating, comment);
        let created = self.feedback.create(&feedback).await?;

        info!("Recorded feedback {} from guest {}", created.id, details.guest.id);
        Ok(created)
    }

    pub async fn list_guests(&self, event_id: &str, admin_id: &str) -> Result<Vec<Guest>, AppError> {
        let event = self.owned_event(event_id, admin_id).await?;
        self.guests.list_by_event(&event.id).await
    }

    pub async fn delete_guest(&self, event_id: &str, admin_id: &str, guest_id: &str) -> Result<(), AppError> {
        let event = self.owned_event(event_id, admin_id).await?;

        if self.guests.delete(&event.id, guest_id).await? == 0 {
            return Err(AppError::NotFound(format!("Guest {} not found", guest_id)));
        }
        info!("Deleted guest {} from event {}", guest_id, event.id);
        Ok(())
    }

    pub async fn list_feedback(&self, event_id: &str, admin_id: &str) -> Result<Vec<FeedbackEntry>, AppError> {
        let event = self.owned_event(event_id, admin_id).await?;
        self.feedback.list_by_event(&event.id).await
    }

    async fn owned_event(&self, event_id: &str, admin_id: &str) -> Result<Event, AppError> {
        self.events.find_owned(event_id, admin_id).await?
            .ok_or_else(|| {
                debug!("Event {} not found or not owned by {}", event_id, admin_id);
                AppError::NotFound("Event not found or access denied".into())
            })
    }

    async fn resolve_token(&self, token: &str) -> Result<GuestDetails, AppError> {
        self.guests.find_by_token(token).await?
            .ok_or_else(|| AppError::NotFound("Invitation not found or no longer valid".into()))
    }

    /// Sends one message per eligible guest, then persists the idempotency flag
    /// for exactly the guests whose send succeeded, in a single batch write.
    async fn dispatch(&self, kind: DispatchKind, event: &Event, guests: Vec<Guest>) -> Result<DispatchOutcome, AppError> {
        let span = info_span!("guest_dispatch", event_id = %event.id, kind = %kind);

        async move {
            let deadline = Instant::now() + self.dispatch_timeout;
            let mut summary = DispatchSummary::default();
            let mut delivered: Vec<String> = Vec::new();

            for guest in &guests {
                if already_dispatched(kind, guest) {
                    debug!("Skipping guest {} ({}): already sent", guest.id, guest.email);
                    summary.skipped_count += 1;
                    continue;
                }

                if Instant::now() >= deadline {
                    if summary.deferred_count == 0 {
                        warn!("Dispatch deadline of {:?} reached; deferring remaining guests", self.dispatch_timeout);
                    }
                    summary.deferred_count += 1;
                    continue;
                }

                summary.attempted_count += 1;
                let sent = match kind {
                    DispatchKind::Invitation => self.notifier.send_invitation(event, guest).await,
                    DispatchKind::FeedbackRequest => self.notifier.send_feedback_request(event, guest).await,
                };

                match sent {
                    Ok(()) => {
                        debug!("Sent {} to {} (guest {})", kind, guest.email, guest.id);
                        summary.sent_count += 1;
                        delivered.push(guest.id.clone());
                    }
                    Err(e) => {
                        error!("Failed to send {} to {} (guest {}): {}", kind, guest.email, guest.id, e);
                        summary.error_count += 1;
                    }
                }
            }

            info!(
                sent = summary.sent_count,
                skipped = summary.skipped_count,
                failed = summary.error_count,
                deferred = summary.deferred_count,
                "Dispatch sending finished"
            );

            if delivered.is_empty() {
                return Ok(DispatchOutcome::Synced(summary));
            }

            let persisted = match kind {
                DispatchKind::Invitation => self.guests.mark_invitation_sent(&delivered).await,
                DispatchKind::FeedbackRequest => self.guests.mark_feedback_sent(&delivered).await,
            };

            match persisted {
                Ok(updated) => {
                    if updated != delivered.len() as u64 {
                        warn!(
                            "Flag update touched {} rows but {} guests were sent to",
                            updated, delivered.len()
                        );
                    }
                    summary.updated_count = updated;
                    Ok(DispatchOutcome::Synced(summary))
                }
                Err(e) => {
                    error!(
                        "Messages were sent to {} guests but their flags could not be persisted: {}",
                        delivered.len(), e
                    );
                    Ok(DispatchOutcome::Unsynced {
                        summary,
                        unsynced_guest_ids: delivered,
                        reason: e.to_string(),
                    })
                }
            }
        }
            .instrument(span)
            .await
    }

    fn spawn_confirmation_email(&self, details: GuestDetails, qr_image: QrImage) {
        let notifier = self.notifier.clone();
        let span = info_span!("rsvp_confirmation_email", guest_id = %details.guest.id);

        tokio::spawn(
            async move {
                let guest_name = details.guest.display_name().to_string();
                match notifier.send_rsvp_confirmation(&details, &guest_name, &qr_image).await {
                    Ok(()) => info!("Confirmation email sent to {}", details.guest.email),
                    Err(e) => error!("Failed to send confirmation email to {}: {}", details.guest.email, e),
                }
            }
                .instrument(span),
        );
    }
}

fn already_dispatched(kind: DispatchKind, guest: &Guest) -> bool {
    match kind {
        DispatchKind::Invitation => guest.invitation_sent,
        DispatchKind::FeedbackRequest => guest.feedback_sent || !guest.attended,
    }
}

fn already_attended() -> AppError {
    AppError::Conflict("Guest has already checked in; the RSVP can no longer change".into())
}

fn checked_in_view(guest: &Guest) -> CheckedInGuest {
    CheckedInGuest {
        guest_id: guest.id.clone(),
        event_id: guest.event_id.clone(),
        guest_name: guest.name.clone(),
        guest_email: guest.email.clone(),
    }
}
