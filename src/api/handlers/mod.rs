pub mod checkin;
pub mod feedback;
pub mod guest;
pub mod health;
pub mod rsvp;
