use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::{get_authenticated_user, optional_user_id, require_auth},
    session::AppState,
};
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::session::{EventSession, SessionBooking, SessionWithStatus};
use crate::services::agenda;

#[derive(Deserialize)]
struct EventQuery {
    event_id: Uuid,
}

#[derive(Deserialize)]
struct SessionQuery {
    session_id: Uuid,
}

#[derive(Deserialize)]
struct MySessionsQuery {
    event_id: Option<Uuid>,
}

/// Agenda for an event. Logged-in callers see which sessions they booked.
async fn get_by_event(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<SessionWithStatus>>> {
    let sessions = EventSession::list_by_event(&state.pool, q.event_id).await?;

    let booked: HashSet<Uuid> = match optional_user_id(&session).await? {
        Some(user_id) => SessionBooking::booked_ids(&state.pool, user_id, q.event_id)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    ok(sessions
        .into_iter()
        .map(|s| SessionWithStatus {
            is_booked: booked.contains(&s.id),
            session: s,
        })
        .collect())
}

async fn get_by_id(
    State(state): State<AppState>,
    Query(q): Query<SessionQuery>,
) -> Result<Envelope<EventSession>> {
    let session = EventSession::find_by_id(&state.pool, q.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    ok(session)
}

#[derive(Deserialize)]
struct BookSessionRequest {
    session_id: Uuid,
}

#[derive(Serialize)]
struct BookingResult {
    session_id: Uuid,
    status: &'static str,
    spots_left: i32,
}

async fn book_session(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<BookSessionRequest>,
) -> Result<Envelope<BookingResult>> {
    let user = get_authenticated_user(&session).await?;

    let booked = agenda::book_session(&state.pool, user.user_id, req.session_id).await?;

    ok(BookingResult {
        session_id: booked.id,
        status: "Booked",
        spots_left: booked.spots_left(),
    })
}

async fn cancel_session_booking(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<BookSessionRequest>,
) -> Result<Envelope<&'static str>> {
    let user = get_authenticated_user(&session).await?;

    agenda::cancel_session_booking(&state.pool, user.user_id, req.session_id).await?;

    ok("Session booking cancelled")
}

async fn get_my_sessions(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<MySessionsQuery>,
) -> Result<Envelope<Vec<EventSession>>> {
    let user = get_authenticated_user(&session).await?;
    ok(EventSession::list_booked_by_user(&state.pool, user.user_id, q.event_id).await?)
}

pub fn router() -> Router<AppState> {
    let protected = Router::new()
        .route("/api/sessions.book_session", post(book_session))
        .route("/api/sessions.cancel_session_booking", post(cancel_session_booking))
        .route("/api/sessions.get_my_sessions", get(get_my_sessions))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/sessions.get_by_event", get(get_by_event))
        .route("/api/sessions.get_by_id", get(get_by_id))
        .merge(protected)
}
