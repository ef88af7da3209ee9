use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl EventStatus {
    /// Status an event should have on `today`
    pub fn for_dates(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Self {
        if today < start_date {
            EventStatus::Upcoming
        } else if today <= end_date {
            EventStatus::Ongoing
        } else {
            EventStatus::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub event_name: String,
    pub banner_image: Option<String>,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String, // "Upcoming", "Ongoing" or "Completed"
    pub capacity: Option<i32>,
    pub venue: Option<String>,
    pub venue_name: Option<String>,
    pub host_name: Option<String>,
    pub organizer: Option<String>,
    pub currency: String,
    pub is_paid_event: bool,
    pub allow_networking: bool,
    pub allow_digital_content: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Find event by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// List all published events, soonest first
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE is_published = TRUE
            ORDER BY start_date ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// List events a user holds a booking for, matched by booker or attendee email
    pub async fn list_booked_by(pool: &PgPool, email: &str) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE id IN (
                SELECT event_id FROM registrations WHERE LOWER(email) = LOWER($1)
                UNION
                SELECT event_id FROM tickets WHERE LOWER(email) = LOWER($1)
            )
            ORDER BY start_date ASC
            "#,
        )
        .bind(email)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// List events whose status may still change
    pub async fn list_not_completed(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE status <> 'Completed'
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// List published, not yet completed events that allow networking
    pub async fn list_networking_enabled(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE is_published = TRUE
              AND allow_networking = TRUE
              AND status <> 'Completed'
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Updates the event status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: EventStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE events
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn status_on(&self, today: NaiveDate) -> EventStatus {
        EventStatus::for_dates(self.start_date, self.end_date, today)
    }
}
