pub mod auth_service;
pub mod guest_lifecycle;
pub mod notifier;
