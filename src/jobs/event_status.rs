use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::models::event::{Event, EventStatus};

#[derive(Debug, Default)]
pub struct StatusStats {
    pub total_checked: usize,
    pub updated: usize,
}

/// Events whose stored status differs from what their dates say on `today`
pub fn pending_transitions(events: &[Event], today: NaiveDate) -> Vec<(&Event, EventStatus)> {
    events
        .iter()
        .filter_map(|event| {
            let status = event.status_on(today);
            (event.status != status.as_str()).then_some((event, status))
        })
        .collect()
}

/// Moves events between Upcoming, Ongoing and Completed according to their dates
pub async fn refresh_event_statuses(pool: &PgPool) -> Result<StatusStats, sqlx::Error> {
    let today = Utc::now().date_naive();
    let events = Event::list_not_completed(pool).await?;

    let mut stats = StatusStats {
        total_checked: events.len(),
        ..Default::default()
    };

    for (event, status) in pending_transitions(&events, today) {
        Event::set_status(pool, event.id, status).await?;
        stats.updated += 1;

        tracing::info!(
            event_id = %event.id,
            from = %event.status,
            to = %status,
            "Event status changed"
        );
    }

    tracing::debug!(?stats, "Event status job completed");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(start: NaiveDate, end: NaiveDate, status: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_name: "Nairobi Tech Week".to_string(),
            banner_image: None,
            description: None,
            start_date: start,
            end_date: end,
            status: status.to_string(),
            capacity: None,
            venue: None,
            venue_name: None,
            host_name: None,
            organizer: None,
            currency: "KES".to_string(),
            is_paid_event: true,
            allow_networking: true,
            allow_digital_content: true,
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    #[test]
    fn test_only_stale_statuses_transition() {
        let events = vec![
            event(day(10), day(12), "Upcoming"),
            event(day(1), day(3), "Upcoming"),
            event(day(4), day(6), "Ongoing"),
        ];

        let transitions = pending_transitions(&events, day(5));
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].0.id, events[1].id);
        assert_eq!(transitions[0].1, EventStatus::Completed);

        let later = pending_transitions(&events, day(11));
        let statuses: Vec<_> = later.iter().map(|(_, s)| *s).collect();
        assert_eq!(
            statuses,
            vec![EventStatus::Ongoing, EventStatus::Completed, EventStatus::Completed]
        );
    }
}
