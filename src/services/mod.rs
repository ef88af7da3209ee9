// Services module - Business logic

pub mod agenda;
pub mod booking;
pub mod check_in;
pub mod matchmaking;
pub mod password;
pub mod pricing;
pub mod qr_generator;
pub mod signature;
