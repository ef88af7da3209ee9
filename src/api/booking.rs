use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::optional_user_id, session::AppState};
use crate::api::params::{non_blank, JsonList};
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::services::{
    booking::{self, AttendeeInput, BookingConfirmation, BookingRequest},
    pricing::{BookingQuote, CartItem},
};

#[derive(Deserialize)]
struct BookingPayload {
    event_id: Uuid,
    email: Option<String>,
    discount_code: Option<String>,
    #[serde(default)]
    attendees: JsonList<AttendeeInput>,
    #[serde(default)]
    cart: JsonList<CartItem>,
}

async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<BookingPayload>,
) -> Result<Envelope<BookingQuote>> {
    let attendees = payload.attendees.into_vec("attendees")?;
    let cart = payload.cart.into_vec("cart")?;

    let quote = booking::quote_booking(
        &state.pool,
        payload.event_id,
        payload.discount_code.as_deref(),
        &attendees,
        &cart,
    )
    .await?;

    ok(quote)
}

/// Books tickets for a group. Guests may book; a logged-in booker is linked
/// to the registration and defaults the booker email.
async fn create_booking(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BookingPayload>,
) -> Result<Envelope<BookingConfirmation>> {
    let attendees = payload.attendees.into_vec("attendees")?;
    let cart = payload.cart.into_vec("cart")?;

    let user = match optional_user_id(&session).await? {
        Some(user_id) => User::find_by_id(&state.pool, user_id).await?,
        None => None,
    };

    let email = non_blank(payload.email)
        .or_else(|| user.as_ref().map(|u| u.email.clone()))
        .ok_or_else(|| AppError::Validation("Booker email is required".to_string()))?;

    let confirmation = booking::create_booking(
        &state.pool,
        &state.ticket_key,
        BookingRequest {
            event_id: payload.event_id,
            email,
            user_id: user.map(|u| u.id),
            discount_code: payload.discount_code,
            attendees,
            cart,
        },
    )
    .await?;

    ok(confirmation)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/booking.quote", post(quote))
        .route("/api/booking.create_booking", post(create_booking))
}
