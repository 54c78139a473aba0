pub mod auth;
pub mod checkin;
pub mod dispatch;
pub mod event;
pub mod feedback;
pub mod guest;
pub mod rsvp;
