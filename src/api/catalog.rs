//! Read-only listings: merchandise, speakers and digital content

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::session::AppState;
use crate::api::response::{ok, Envelope};
use crate::error::Result;
use crate::models::{content::DigitalContent, merchandise::Merchandise, speaker::Speaker};

#[derive(Deserialize)]
struct EventQuery {
    event_id: Uuid,
}

async fn merchandise_by_event(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<Merchandise>>> {
    ok(Merchandise::list_by_event(&state.pool, q.event_id).await?)
}

async fn get_all_speakers(State(state): State<AppState>) -> Result<Envelope<Vec<Speaker>>> {
    ok(Speaker::list_all(&state.pool).await?)
}

async fn content_by_event(
    State(state): State<AppState>,
    Query(q): Query<EventQuery>,
) -> Result<Envelope<Vec<DigitalContent>>> {
    ok(DigitalContent::list_by_event(&state.pool, q.event_id).await?)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/merchandise.get_by_event", get(merchandise_by_event))
        .route("/api/speaker.get_all_speakers", get(get_all_speakers))
        .route("/api/content.get_by_event", get(content_by_event))
}
