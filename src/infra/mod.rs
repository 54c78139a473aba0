pub mod email;
pub mod factory;
pub mod qr;
pub mod repositories;
