use axum::{
    extract::{Query, State},
    middleware,
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
use crate::api::params::{non_blank, optional_url, required, JsonList};
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::{
    event::Event,
    feedback::{is_valid_rating, EventFeedback, FeedbackSummary, MAX_RATING, MIN_RATING},
    report::RevenueRow,
    ticket_type::TicketType,
    sponsorship::{
        BoothPackage, CreateExhibitorData, CreateSponsorData, Exhibitor, Sponsor, SponsorTier,
    },
};
use crate::services::booking::{self, is_plausible_email, AttendeeInput, BookingRequest};

#[derive(Deserialize)]
pub struct EventQuery {
    pub event_id: Uuid,
}

#[derive(Deserialize)]
pub struct OptionalEventQuery {
    pub event_id: Option<Uuid>,
}

async fn get_all(State(state): State<AppState>) -> Result<Envelope<Vec<Event>>> {
    ok(Event::list_published(&state.pool).await?)
}

async fn get_by_id(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Event>> {
    let event = Event::find_by_id(&state.pool, q.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    ok(event)
}

/// Events the logged-in user holds tickets for
async fn get_my_events(
    State(state): State<AppState>,
    session: Session,
) -> Result<Envelope<Vec<Event>>> {
    let user = current_user(&state.pool, &session).await?;
    ok(Event::list_booked_by(&state.pool, &user.email).await?)
}

async fn get_sponsor_tiers(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<SponsorTier>>> {
    ok(SponsorTier::list_by_event(&state.pool, q.event_id).await?)
}

async fn get_booth_packages(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<BoothPackage>>> {
    ok(BoothPackage::list_by_event(&state.pool, q.event_id).await?)
}

#[derive(Deserialize)]
struct CreateExhibitorRequest {
    event_id: Uuid,
    booth_package_id: Uuid,
    exhibitor_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    logo: Option<String>,
    website: Option<String>,
    notes: Option<String>,
}

#[derive(Serialize)]
struct CreatedResponse<T> {
    status: &'static str,
    message: &'static str,
    #[serde(flatten)]
    record: T,
}

/// Records an exhibitor request and holds one booth of the chosen package
async fn create_exhibitor(
    State(state): State<AppState>,
    Json(req): Json<CreateExhibitorRequest>,
) -> Result<Envelope<CreatedResponse<Exhibitor>>> {
    let exhibitor_name = required(req.exhibitor_name, "exhibitor_name")?;
    let phone = required(req.phone, "phone")?;
    let email = required(req.email, "email")?;
    if !is_plausible_email(&email) {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    let website = optional_url(req.website, "website")?;

    let package = BoothPackage::find_by_id(&state.pool, req.booth_package_id)
        .await?
        .filter(|p| p.event_id == req.event_id)
        .ok_or_else(|| {
            AppError::Validation("Booth package does not belong to this event".to_string())
        })?;

    let mut tx = state.pool.begin().await?;

    if !BoothPackage::claim_booth(&mut tx, package.id).await? {
        return Err(AppError::Validation(format!(
            "No booths left in the {} package",
            package.package_name
        )));
    }

    let exhibitor = Exhibitor::create(
        &mut tx,
        CreateExhibitorData {
            event_id: req.event_id,
            booth_package_id: package.id,
            exhibitor_name,
            email,
            phone,
            logo: non_blank(req.logo),
            website,
            notes: non_blank(req.notes),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        exhibitor_id = %exhibitor.id,
        event_id = %exhibitor.event_id,
        booth_package_id = %package.id,
        "Exhibitor request created"
    );

    ok(CreatedResponse {
        status: "Created",
        message: "Exhibitor registration submitted successfully",
        record: exhibitor,
    })
}

#[derive(Deserialize)]
struct CreateSponsorRequest {
    sponsor_name: Option<String>,
    tier_id: Uuid,
    event_id: Option<Uuid>,
    company: Option<String>,
    company_logo: Option<String>,
}

#[derive(Serialize)]
struct SponsorCreated {
    #[serde(flatten)]
    sponsor: Sponsor,
    tier_name: String,
    amount: i64,
    currency: String,
}

async fn create_sponsor(
    State(state): State<AppState>,
    Json(req): Json<CreateSponsorRequest>,
) -> Result<Envelope<CreatedResponse<SponsorCreated>>> {
    let sponsor_name = required(req.sponsor_name, "sponsor_name")?;

    let tier = SponsorTier::find_by_id(&state.pool, req.tier_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sponsor tier not found".to_string()))?;

    let sponsor = Sponsor::create(
        &state.pool,
        CreateSponsorData {
            event_id: req.event_id.unwrap_or(tier.event_id),
            tier_id: tier.id,
            sponsor_name,
            company: non_blank(req.company),
            company_logo: non_blank(req.company_logo),
        },
    )
    .await?;

    tracing::info!(sponsor_id = %sponsor.id, tier = %tier.tier_name, "Sponsor created");

    ok(CreatedResponse {
        status: "Created",
        message: "Sponsor registration submitted successfully",
        record: SponsorCreated {
            sponsor,
            tier_name: tier.tier_name,
            amount: tier.amount,
            currency: tier.currency,
        },
    })
}

#[derive(Deserialize)]
struct RegisterForEventRequest {
    event_id: Uuid,
    #[serde(default)]
    attendees: JsonList<AttendeeInput>,
}

#[derive(Serialize)]
struct EventRegistration {
    registration_id: Uuid,
    event_id: Uuid,
    confirmation_code: String,
    tickets: usize,
}

/// Registers the logged-in user for an event without merchandise. With no
/// attendees given, the user attends alone on the cheapest ticket type.
async fn register_for_event(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterForEventRequest>,
) -> Result<Envelope<CreatedResponse<EventRegistration>>> {
    let user = current_user(&state.pool, &session).await?;
    let mut attendees = req.attendees.into_vec("attendees")?;

    if attendees.is_empty() {
        let ticket_type = TicketType::list_by_event(&state.pool, req.event_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Validation("This event has no ticket types".to_string())
            })?;

        attendees.push(AttendeeInput {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            ticket_type: ticket_type.id,
            merchandise: vec![],
        });
    }

    let confirmation = booking::create_booking(
        &state.pool,
        &state.ticket_key,
        BookingRequest {
            event_id: req.event_id,
            email: user.email,
            user_id: Some(user.id),
            discount_code: None,
            attendees,
            cart: vec![],
        },
    )
    .await?;

    ok(CreatedResponse {
        status: "Registered",
        message: "Successfully registered for the event",
        record: EventRegistration {
            registration_id: confirmation.registration_id,
            event_id: req.event_id,
            confirmation_code: confirmation.confirmation_code,
            tickets: confirmation.tickets.len(),
        },
    })
}

#[derive(Deserialize)]
struct FeedbackRequest {
    event_id: Uuid,
    rating: i32,
    feedback: Option<String>,
}

async fn submit_feedback(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<FeedbackRequest>,
) -> Result<Envelope<CreatedResponse<EventFeedback>>> {
    let user = current_user(&state.pool, &session).await?;

    if !is_valid_rating(req.rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    Event::find_by_id(&state.pool, req.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let entry = EventFeedback::create(
        &state.pool,
        req.event_id,
        user.id,
        req.rating,
        non_blank(req.feedback),
    )
    .await?;

    ok(CreatedResponse {
        status: "Submitted",
        message: "Thank you for your feedback",
        record: entry,
    })
}

async fn get_event_feedback(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<FeedbackSummary>> {
    let entries = EventFeedback::list_by_event(&state.pool, q.event_id).await?;
    ok(FeedbackSummary::from_entries(entries))
}

async fn revenue_breakdown(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<OptionalEventQuery>,
) -> Result<Envelope<Vec<RevenueRow>>> {
    require_event_manager(&state.pool, &session).await?;
    ok(RevenueRow::breakdown(&state.pool, q.event_id).await?)
}

pub fn router() -> Router<AppState> {
    let protected = Router::new()
        .route("/api/events.get_my_events", get(get_my_events))
        .route("/api/events.register_for_event", post(register_for_event))
        .route("/api/events.submit_feedback", post(submit_feedback))
        .route("/api/events.revenue_breakdown", get(revenue_breakdown))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/events.get_all", get(get_all))
        .route("/api/events.get_by_id", get(get_by_id))
        .route("/api/events.get_sponsor_tiers", get(get_sponsor_tiers))
        .route("/api/events.get_booth_packages", get(get_booth_packages))
        .route("/api/events.create_exhibitor", post(create_exhibitor))
        .route("/api/events.create_sponsor", post(create_sponsor))
        .route("/api/events.get_event_feedback", get(get_event_feedback))
        .merge(protected)
}
