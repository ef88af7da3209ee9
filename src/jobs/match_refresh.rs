use sqlx::PgPool;

use crate::models::event::Event;
use crate::services::matchmaking;

/// Computes new match suggestions for every event that allows networking.
/// Returns the number of suggestions created.
pub async fn refresh_matches(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let events = Event::list_networking_enabled(pool).await?;

    let mut created = 0;
    for event in &events {
        match matchmaking::suggest_for_event(pool, event.id).await {
            Ok(count) => created += count,
            Err(e) => {
                tracing::error!(event_id = %event.id, error = %e, "Match refresh failed for event");
            }
        }
    }

    tracing::info!(events = events.len(), created, "Match refresh job completed");

    Ok(created)
}
