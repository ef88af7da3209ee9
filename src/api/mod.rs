// API module - HTTP endpoints

pub mod auth;
pub mod booking;
pub mod catalog;
pub mod events;
pub mod health;
pub mod middleware;
pub mod networking;
pub mod params;
pub mod response;
pub mod sessions;
pub mod tickets;

use axum::Router;

use middleware::session::AppState;

/// Every route of the service, without session or tracing layers
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(events::router())
        .merge(sessions::router())
        .merge(booking::router())
        .merge(tickets::router())
        .merge(networking::router())
        .merge(catalog::router())
}
