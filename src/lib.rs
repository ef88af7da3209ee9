//! Eventive: conference registration, ticketing, agenda and networking backend

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
