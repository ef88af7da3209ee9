use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::{current_user, require_auth, require_event_manager},
    session::AppState,
};
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::{
    check_in_scan::CheckInScan,
    event::Event,
    registration::{AttendeeMerchandise, Registration, RegistrationAttendee},
    ticket::{Ticket, TicketSummary},
    ticket_type::TicketType,
};
use crate::services::{
    check_in::{self, CheckInResult, CheckInStats},
    qr_generator,
};

#[derive(Deserialize)]
struct EventQuery {
    event_id: Uuid,
}

#[derive(Deserialize)]
struct TicketQuery {
    ticket_id: Uuid,
    format: Option<String>,
}

#[derive(Serialize)]
struct AttendeeDetails {
    #[serde(flatten)]
    attendee: RegistrationAttendee,
    merchandise: Vec<AttendeeMerchandise>,
}

#[derive(Serialize)]
struct RegistrationDetails {
    has_registration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration: Option<Registration>,
    attendees: Vec<AttendeeDetails>,
    tickets: Vec<Ticket>,
}

/// The caller's latest registration for an event, with attendee lines,
/// merchandise and tickets
async fn get_registration(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<RegistrationDetails>> {
    let user = current_user(&state.pool, &session).await?;

    let Some(registration) =
        Registration::find_by_email_and_event(&state.pool, &user.email, q.event_id).await?
    else {
        return ok(RegistrationDetails {
            has_registration: false,
            event_name: None,
            registration: None,
            attendees: vec![],
            tickets: vec![],
        });
    };

    let event = Event::find_by_id(&state.pool, q.event_id).await?;
    let attendees = RegistrationAttendee::list_by_registration(&state.pool, registration.id).await?;
    let attendee_ids: Vec<Uuid> = attendees.iter().map(|a| a.id).collect();
    let lines = AttendeeMerchandise::list_by_attendees(&state.pool, &attendee_ids).await?;
    let tickets = Ticket::list_by_registration(&state.pool, registration.id).await?;

    let attendees = attendees
        .into_iter()
        .map(|attendee| AttendeeDetails {
            merchandise: lines
                .iter()
                .filter(|l| l.attendee_id == attendee.id)
                .cloned()
                .collect(),
            attendee,
        })
        .collect();

    ok(RegistrationDetails {
        has_registration: true,
        event_name: event.map(|e| e.event_name),
        registration: Some(registration),
        attendees,
        tickets,
    })
}

#[derive(Serialize)]
struct TicketLookup {
    has_ticket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket: Option<TicketSummary>,
}

/// The caller's valid ticket for an event
async fn get_ticket(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<TicketLookup>> {
    let user = current_user(&state.pool, &session).await?;
    let ticket = Ticket::find_valid_summary(&state.pool, &user.email, q.event_id).await?;

    ok(TicketLookup {
        has_ticket: ticket.is_some(),
        ticket,
    })
}

#[derive(Serialize)]
struct HasTicket {
    has_ticket: bool,
}

async fn has_ticket(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<HasTicket>> {
    let user = current_user(&state.pool, &session).await?;
    let ticket = Ticket::find_valid_summary(&state.pool, &user.email, q.event_id).await?;

    ok(HasTicket {
        has_ticket: ticket.is_some(),
    })
}

async fn get_ticket_types(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<TicketType>>> {
    ok(TicketType::list_by_event(&state.pool, q.event_id).await?)
}

async fn get_my_tickets(
    State(state): State<AppState>,
    session: Session,
) -> Result<Envelope<Vec<TicketSummary>>> {
    let user = current_user(&state.pool, &session).await?;
    ok(Ticket::list_summaries_by_email(&state.pool, &user.email).await?)
}

/// Loads a ticket the caller holds. Other people's tickets are reported as
/// forbidden.
async fn owned_ticket(
    state: &AppState,
    session: &Session,
    ticket_id: Uuid,
) -> Result<TicketSummary> {
    let user = current_user(&state.pool, session).await?;

    let ticket = Ticket::find_summary_by_id(&state.pool, ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if !ticket.email.eq_ignore_ascii_case(&user.email) {
        return Err(AppError::Forbidden(
            "You don't have permission to access this ticket".to_string(),
        ));
    }

    Ok(ticket)
}

#[derive(Serialize)]
struct TicketDownload {
    #[serde(flatten)]
    ticket: TicketSummary,
    qr_svg: String,
}

async fn download_ticket(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<TicketQuery>,
) -> Result<Envelope<TicketDownload>> {
    let ticket = owned_ticket(&state, &session, q.ticket_id).await?;
    let qr_svg = qr_generator::generate_qr_svg(&ticket.qr_code)?;

    ok(TicketDownload { ticket, qr_svg })
}

/// QR image of a ticket code: SVG by default, PNG with `format=png`
async fn qr_code(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<TicketQuery>,
) -> Result<Response> {
    let ticket = owned_ticket(&state, &session, q.ticket_id).await?;

    let response = match q.format.as_deref() {
        Some("png") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/png")],
            qr_generator::generate_qr_png(&ticket.qr_code)?,
        )
            .into_response(),
        None | Some("svg") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/svg+xml")],
            qr_generator::generate_qr_svg(&ticket.qr_code)?,
        )
            .into_response(),
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unsupported QR format: {}",
                other
            )))
        }
    };

    Ok(response)
}

#[derive(Deserialize)]
struct CheckInRequest {
    event_id: Uuid,
    qr_code: String,
}

async fn check_in(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CheckInRequest>,
) -> Result<Envelope<CheckInResult>> {
    let manager = require_event_manager(&state.pool, &session).await?;

    let result = check_in::check_in(
        &state.pool,
        &state.ticket_key,
        req.event_id,
        &req.qr_code,
        Some(manager.id),
    )
    .await?;

    ok(result)
}

async fn check_in_stats(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<CheckInStats>> {
    require_event_manager(&state.pool, &session).await?;
    ok(check_in::stats(&state.pool, q.event_id).await?)
}

#[derive(Deserialize)]
struct ScanLogQuery {
    event_id: Uuid,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Most recent scans first, 50 per page by default
async fn get_check_in_scans(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<ScanLogQuery>,
) -> Result<Envelope<Vec<CheckInScan>>> {
    require_event_manager(&state.pool, &session).await?;

    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let offset = q.offset.unwrap_or(0).max(0);

    ok(CheckInScan::list_by_event(&state.pool, q.event_id, limit, offset).await?)
}

pub fn router() -> Router<AppState> {
    let protected = Router::new()
        .route("/api/ticket.get_registration", get(get_registration))
        .route("/api/ticket.get_ticket", get(get_ticket))
        .route("/api/ticket.has_ticket", get(has_ticket))
        .route("/api/ticket.get_my_tickets", get(get_my_tickets))
        .route("/api/ticket.download_ticket", get(download_ticket))
        .route("/api/ticket.qr_code", get(qr_code))
        .route("/api/ticket.check_in", post(check_in))
        .route("/api/ticket.check_in_stats", get(check_in_stats))
        .route("/api/ticket.get_check_in_scans", get(get_check_in_scans))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/ticket.get_ticket_types", get(get_ticket_types))
        .merge(protected)
}
