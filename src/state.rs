use std::sync::Arc;
use crate::domain::ports::{EventRepository, GuestRepository};
use crate::domain::services::{auth_service::AuthService, guest_lifecycle::GuestLifecycle};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub event_repo: Arc<dyn EventRepository>,
    pub guest_repo: Arc<dyn GuestRepository>,
    pub lifecycle: Arc<GuestLifecycle>,
    pub auth_service: Arc<AuthService>,
}
