use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const TICKET_STATUS_VALID: &str = "Valid";
pub const TICKET_STATUS_CANCELLED: &str = "Cancelled";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub attendee_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
    pub email: String,
    pub qr_code: String,
    pub status: String, // "Valid" or "Cancelled"
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub issue_date: DateTime<Utc>,
}

/// Ticket joined with the event and ticket type details shown to the holder
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketSummary {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub venue: Option<String>,
    pub venue_name: Option<String>,
    pub ticket_type_id: Uuid,
    pub ticket_category: String,
    pub ticket_category_name: String,
    pub access_level: Option<String>,
    pub ticket_price: i64,
    pub email: String,
    pub qr_code: String,
    pub status: String,
    pub checked_in: bool,
    pub issue_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTicketData {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub attendee_id: Uuid,
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
    pub email: String,
    pub qr_code: String,
}

const SUMMARY_SELECT: &str = r#"
    SELECT
        t.id, t.registration_id, t.event_id, e.event_name, e.start_date, e.end_date,
        e.venue, e.venue_name, t.ticket_type_id, tt.ticket_category,
        tt.ticket_category_name, tt.access_level, tt.ticket_price,
        t.email, t.qr_code, t.status, t.checked_in, t.issue_date
    FROM tickets t
    JOIN events e ON e.id = t.event_id
    JOIN ticket_types tt ON tt.id = t.ticket_type_id
"#;

impl Ticket {
    /// Issues a ticket. The id is chosen by the caller so the QR code can be
    /// signed before the row exists.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateTicketData,
    ) -> Result<Self, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO tickets (
                id, registration_id, attendee_id, event_id, ticket_type_id, email, qr_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.id)
        .bind(data.registration_id)
        .bind(data.attendee_id)
        .bind(data.event_id)
        .bind(data.ticket_type_id)
        .bind(&data.email)
        .bind(&data.qr_code)
        .fetch_one(&mut **tx)
        .await?;

        Ok(ticket)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM tickets WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    /// Counts valid tickets for an event, locking the event row so concurrent
    /// bookings see each other's tickets
    pub async fn count_valid_for_event_locked(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .execute(&mut **tx)
            .await?;

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tickets
            WHERE event_id = $1 AND status = 'Valid'
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count)
    }

    /// Lists tickets of a registration
    pub async fn list_by_registration(
        pool: &PgPool,
        registration_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tickets = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM tickets
            WHERE registration_id = $1
            ORDER BY issue_date ASC
            "#,
        )
        .bind(registration_id)
        .fetch_all(pool)
        .await?;

        Ok(tickets)
    }

    /// Finds the first valid ticket held by an email for an event
    pub async fn find_valid_summary(
        pool: &PgPool,
        email: &str,
        event_id: Uuid,
    ) -> Result<Option<TicketSummary>, sqlx::Error> {
        let query = format!(
            "{} WHERE LOWER(t.email) = LOWER($1) AND t.event_id = $2 AND t.status = 'Valid' ORDER BY t.issue_date ASC LIMIT 1",
            SUMMARY_SELECT
        );

        let ticket = sqlx::query_as::<_, TicketSummary>(&query)
            .bind(email)
            .bind(event_id)
            .fetch_optional(pool)
            .await?;

        Ok(ticket)
    }

    /// Lists every ticket held by an email, newest first
    pub async fn list_summaries_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Vec<TicketSummary>, sqlx::Error> {
        let query = format!(
            "{} WHERE LOWER(t.email) = LOWER($1) ORDER BY t.issue_date DESC",
            SUMMARY_SELECT
        );

        let tickets = sqlx::query_as::<_, TicketSummary>(&query)
            .bind(email)
            .fetch_all(pool)
            .await?;

        Ok(tickets)
    }

    pub async fn find_summary_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TicketSummary>, sqlx::Error> {
        let query = format!("{} WHERE t.id = $1", SUMMARY_SELECT);

        let ticket = sqlx::query_as::<_, TicketSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(ticket)
    }

    /// Marks a valid ticket as checked in. Returns None if it was already
    /// checked in or is not valid.
    pub async fn mark_checked_in(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Self>(
            r#"
            UPDATE tickets
            SET checked_in = TRUE, checked_in_at = NOW()
            WHERE id = $1 AND status = 'Valid' AND checked_in = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    pub fn is_valid(&self) -> bool {
        self.status == TICKET_STATUS_VALID
    }
}
