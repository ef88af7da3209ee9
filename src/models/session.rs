use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::services::agenda::TimeSlot;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSession {
    pub id: Uuid,
    pub event_id: Uuid,
    pub session_title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub track: Option<String>,
    pub session_type: Option<String>,
    pub talk_name: Option<String>,
    pub capacity: i32,
    pub booked_spots: i32,
    pub allow_booking: bool,
}

/// Session listing entry with the caller's booking flag
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithStatus {
    #[serde(flatten)]
    pub session: EventSession,
    pub is_booked: bool,
}

impl EventSession {
    /// Lists all sessions of an event in agenda order
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sessions = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM event_sessions
            WHERE event_id = $1
            ORDER BY start_time ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let session = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM event_sessions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Lists the sessions of an event a user has booked
    pub async fn list_booked_by_user<'e, E>(
        executor: E,
        user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sessions = sqlx::query_as::<_, Self>(
            r#"
            SELECT s.* FROM event_sessions s
            JOIN session_bookings b ON b.session_id = s.id
            WHERE b.user_id = $1
              AND ($2::uuid IS NULL OR s.event_id = $2)
            ORDER BY s.start_time ASC
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(executor)
        .await?;

        Ok(sessions)
    }

    /// Takes one spot if the session is not full. Returns false when full.
    pub async fn reserve_spot(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE event_sessions
            SET booked_spots = booked_spots + 1
            WHERE id = $1 AND booked_spots < capacity
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Gives a spot back
    pub async fn release_spot(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE event_sessions
            SET booked_spots = booked_spots - 1
            WHERE id = $1 AND booked_spots > 0
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    pub fn spots_left(&self) -> i32 {
        (self.capacity - self.booked_spots).max(0)
    }
}

pub struct SessionBooking;

impl SessionBooking {
    /// Records a booking. Returns false if the user already holds it.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_bookings (session_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Removes a booking. Returns false if there was none.
    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM session_bookings
            WHERE session_id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Session ids a user has booked within an event
    pub async fn booked_ids(
        pool: &PgPool,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT b.session_id FROM session_bookings b
            JOIN event_sessions s ON s.id = b.session_id
            WHERE b.user_id = $1 AND s.event_id = $2
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}
