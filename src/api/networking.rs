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
    auth::{current_user, require_auth},
    session::AppState,
};
use crate::api::params::non_blank;
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::{
    attendee_profile::AttendeeProfile,
    event::Event,
    message::{CreateMessageData, NetworkingMessage},
    networking::{MatchStatus, MatchSuggestion, MatchView},
    user::User,
};

#[derive(Deserialize)]
struct MatchQuery {
    event_id: Option<Uuid>,
}

/// Matches of the caller's current profile in a given status. Users without a
/// profile, or who opted out of networking, see nothing.
async fn matches_for(
    state: &AppState,
    session: &Session,
    status: MatchStatus,
    event_id: Option<Uuid>,
) -> Result<Vec<MatchView>> {
    let user = current_user(&state.pool, session).await?;

    let profile = match AttendeeProfile::find_by_user(&state.pool, user.id).await? {
        Some(p) if p.open_to_networking => p,
        _ => return Ok(vec![]),
    };

    Ok(MatchSuggestion::list_for_profile(&state.pool, profile.id, status, event_id).await?)
}

async fn get_matches(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<MatchQuery>,
) -> Result<Envelope<Vec<MatchView>>> {
    ok(matches_for(&state, &session, MatchStatus::Suggested, q.event_id).await?)
}

async fn get_connected(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<MatchQuery>,
) -> Result<Envelope<Vec<MatchView>>> {
    ok(matches_for(&state, &session, MatchStatus::Connected, q.event_id).await?)
}

#[derive(Deserialize)]
struct ConnectRequest {
    match_id: Uuid,
}

async fn connect(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<ConnectRequest>,
) -> Result<Envelope<MatchSuggestion>> {
    let user = current_user(&state.pool, &session).await?;

    let suggestion = MatchSuggestion::find_by_id(&state.pool, req.match_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;

    let profiles = AttendeeProfile::list_by_user(&state.pool, user.id).await?;
    if !profiles.iter().any(|p| suggestion.involves(p.id)) {
        return Err(AppError::Forbidden(
            "This match does not involve you".to_string(),
        ));
    }

    let connected = MatchSuggestion::mark_connected(&state.pool, suggestion.id).await?;

    tracing::info!(match_id = %connected.id, user_id = %user.id, "Match connected");

    ok(connected)
}

#[derive(Deserialize)]
struct SendMessageRequest {
    receiver_id: Option<Uuid>,
    event_id: Option<Uuid>,
    message: Option<String>,
}

async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SendMessageRequest>,
) -> Result<Envelope<NetworkingMessage>> {
    let user = current_user(&state.pool, &session).await?;

    let (Some(receiver_id), Some(event_id), Some(text)) =
        (req.receiver_id, req.event_id, non_blank(req.message))
    else {
        return Err(AppError::Validation(
            "receiver_id, event_id and message are required".to_string(),
        ));
    };

    if receiver_id == user.id {
        return Err(AppError::Validation(
            "You cannot message yourself".to_string(),
        ));
    }

    let receiver = User::find_by_id(&state.pool, receiver_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Receiver not found".to_string()))?;

    Event::find_by_id(&state.pool, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let sender_name = AttendeeProfile::find_by_user(&state.pool, user.id)
        .await?
        .and_then(|p| p.full_name)
        .unwrap_or(user.full_name);

    let message = NetworkingMessage::create(
        &state.pool,
        CreateMessageData {
            event_id,
            sender_id: user.id,
            receiver_id: receiver.id,
            sender_name,
            receiver_name: receiver.full_name,
            message: text,
        },
    )
    .await?;

    tracing::debug!(message_id = %message.id, event_id = %event_id, "Networking message sent");

    ok(message)
}

#[derive(Deserialize)]
struct ConversationQuery {
    other_user_id: Option<Uuid>,
    event_id: Option<Uuid>,
}

async fn get_messages(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<ConversationQuery>,
) -> Result<Envelope<Vec<NetworkingMessage>>> {
    let user = current_user(&state.pool, &session).await?;

    let (Some(other_user_id), Some(event_id)) = (q.other_user_id, q.event_id) else {
        return Err(AppError::Validation(
            "other_user_id and event_id are required".to_string(),
        ));
    };

    ok(NetworkingMessage::list_conversation(&state.pool, event_id, user.id, other_user_id).await?)
}

#[derive(Deserialize)]
struct MarkReadRequest {
    message_id: Uuid,
}

#[derive(Serialize)]
struct MarkedRead {
    message_id: Uuid,
    is_read: bool,
}

/// Only the receiver may mark a message read
async fn mark_as_read(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<MarkReadRequest>,
) -> Result<Envelope<MarkedRead>> {
    let user = current_user(&state.pool, &session).await?;

    let message = NetworkingMessage::mark_read(&state.pool, req.message_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

    ok(MarkedRead {
        message_id: message.id,
        is_read: message.is_read,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/networking.get_matches", get(get_matches))
        .route("/api/networking.get_connected", get(get_connected))
        .route("/api/networking.connect", post(connect))
        .route("/api/networking.send_message", post(send_message))
        .route("/api/networking.get_messages", get(get_messages))
        .route("/api/networking.mark_as_read", post(mark_as_read))
        .route_layer(middleware::from_fn(require_auth))
}
